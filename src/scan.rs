//! Iterated search over a scrolling cursor.
//!
//! [`Scan`] drives the engine's cursor protocol as a cooperative pull
//! sequence: each [`next_step`](Scan::next_step) call blocks until the
//! engine answers, pages are fetched strictly one at a time, and the
//! walk is single-pass and non-restartable.
//!
//! On exhaustion the running record count is checked against the total
//! the engine declared on the first page. A match releases the cursor
//! and ends the sequence; a mismatch fails with
//! [`Error::IncompleteScroll`] and deliberately leaves the cursor open
//! for inspection.
//!
//! # Caveat
//!
//! Dropping a [`Scan`] before exhaustion abandons the cursor without
//! releasing it; the engine holds it until its lifetime expires.
//! Cleanup on early abandonment is the consumer's responsibility.
//!
//! # Example
//!
//! ```rust,no_run
//! # use search_ext::{SearchClient, ScanOptions, ClientConfig};
//! # use serde_json::json;
//! # async fn example() -> search_ext::Result<()> {
//! let client = SearchClient::new(ClientConfig::default())?;
//! let mut scan = client.scan(ScanOptions {
//!     index: Some("tweets".to_string()),
//!     body: json!({ "query": { "match_all": {} } }),
//!     scroll: Some("5m".to_string()),
//!     ..ScanOptions::default()
//! })?;
//! while let Some(step) = scan.next_step().await? {
//!     for record in step.payload.as_records() {
//!         println!("{}", record["_id"]);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::page::Page;
use crate::transport::{QueryTarget, Transport};

/// Parameters for an iterated search.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Index to search; all indices when absent.
    pub index: Option<String>,
    /// Document type to search; all types when absent.
    pub doc_type: Option<String>,
    /// The query body.
    pub body: Value,
    /// Cursor lifetime, e.g. `"5m"`. Mandatory.
    pub scroll: Option<String>,
    /// Yield whole pages (`true`, the default) or one record per step.
    pub chunked: bool,
    /// Attach per-step metadata (the page response minus its record
    /// array). Defaults to `false`.
    pub with_meta: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            index: None,
            doc_type: None,
            body: Value::Null,
            scroll: None,
            chunked: true,
            with_meta: false,
        }
    }
}

/// One step of an iterated search.
#[derive(Debug, Clone)]
pub struct ScanStep {
    pub payload: ScanPayload,
    /// Present when the scan was opened with `with_meta`.
    pub meta: Option<Value>,
}

/// The records delivered by one step: a whole page in chunked mode, a
/// single record otherwise.
#[derive(Debug, Clone)]
pub enum ScanPayload {
    Batch(Vec<Value>),
    Record(Value),
}

impl ScanPayload {
    /// View the step's records as a slice, regardless of mode.
    pub fn as_records(&self) -> &[Value] {
        match self {
            ScanPayload::Batch(records) => records,
            ScanPayload::Record(record) => std::slice::from_ref(record),
        }
    }

    /// Consume the payload into its records.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            ScanPayload::Batch(records) => records,
            ScanPayload::Record(record) => vec![record],
        }
    }
}

enum State {
    /// No network call issued yet.
    Init,
    /// A cursor is open; `scroll_id` is the token for the next advance.
    Streaming { scroll_id: String },
    /// Exhausted, corrupted, or aborted; no further calls are made.
    Done,
}

/// A lazy, single-pass walk over a scrolling query's full result set.
pub struct Scan {
    transport: Arc<dyn Transport>,
    target: QueryTarget,
    body: Value,
    scroll: String,
    chunked: bool,
    with_meta: bool,
    state: State,
    expected: u64,
    retrieved: u64,
    /// Token of the most recent page that carried records.
    last_productive: String,
    ready: VecDeque<ScanStep>,
}

impl std::fmt::Debug for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("target", &self.target)
            .field("body", &self.body)
            .field("scroll", &self.scroll)
            .field("chunked", &self.chunked)
            .field("with_meta", &self.with_meta)
            .field("expected", &self.expected)
            .field("retrieved", &self.retrieved)
            .field("last_productive", &self.last_productive)
            .finish_non_exhaustive()
    }
}

impl Scan {
    /// Validate options and prepare a scan. No network call is made
    /// until the first [`next_step`](Scan::next_step).
    pub fn new(transport: Arc<dyn Transport>, options: ScanOptions) -> Result<Self> {
        let scroll = match options.scroll {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                return Err(Error::InvalidArgument(
                    "scroll duration is required for iterated search".to_string(),
                ))
            }
        };

        Ok(Self {
            transport,
            target: QueryTarget {
                index: options.index,
                doc_type: options.doc_type,
            },
            body: options.body,
            scroll,
            chunked: options.chunked,
            with_meta: options.with_meta,
            state: State::Init,
            expected: 0,
            retrieved: 0,
            last_productive: String::new(),
            ready: VecDeque::new(),
        })
    }

    /// Pull the next step, fetching a page from the engine when the
    /// current one is spent. Returns `Ok(None)` once the result set is
    /// exhausted and the cursor has been released.
    pub async fn next_step(&mut self) -> Result<Option<ScanStep>> {
        loop {
            if let Some(step) = self.ready.pop_front() {
                return Ok(Some(step));
            }

            let page = match &self.state {
                State::Init => {
                    let page = self
                        .transport
                        .execute_query(&self.target, &self.body, &self.scroll)
                        .await?;
                    self.expected = page.total();
                    self.last_productive = page.scroll_id().to_string();
                    debug!(total = self.expected, "scan opened");
                    page
                }
                State::Streaming { scroll_id } => {
                    self.transport
                        .advance_cursor(scroll_id, &self.scroll)
                        .await?
                }
                State::Done => return Ok(None),
            };

            if page.is_empty() {
                return self.finish(&page).await.map(|_| None);
            }

            self.retrieved += page.len() as u64;
            self.last_productive = page.scroll_id().to_string();
            self.state = State::Streaming {
                scroll_id: page.scroll_id().to_string(),
            };
            self.stage(page);
        }
    }

    /// Drain the scan and return every record in order.
    pub async fn collect_records(mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(step) = self.next_step().await? {
            records.extend(step.payload.into_records());
        }
        Ok(records)
    }

    /// Queue the steps for one page of records.
    fn stage(&mut self, page: Page) {
        let meta = self.with_meta.then(|| page.meta());
        if self.chunked {
            self.ready.push_back(ScanStep {
                payload: ScanPayload::Batch(page.into_hits()),
                meta,
            });
        } else {
            for record in page.into_hits() {
                self.ready.push_back(ScanStep {
                    payload: ScanPayload::Record(record),
                    meta: meta.clone(),
                });
            }
        }
    }

    /// Exhaustion: verify the accounting, then release the cursor on
    /// success. On a shortfall the cursor is left open and the full
    /// diagnostic context is surfaced.
    async fn finish(&mut self, final_page: &Page) -> Result<()> {
        self.state = State::Done;

        if self.retrieved != self.expected {
            return Err(Error::IncompleteScroll {
                expected: self.expected,
                retrieved: self.retrieved,
                last_scroll_id: self.last_productive.clone(),
                final_scroll_id: final_page.scroll_id().to_string(),
            });
        }

        debug!(retrieved = self.retrieved, "scan exhausted");
        if let Err(e) = self.transport.release_cursor(final_page.scroll_id()).await {
            // Non-fatal: the walk already completed.
            warn!(error = %e, "failed to release scroll cursor");
        }
        Ok(())
    }
}
