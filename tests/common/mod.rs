//! Shared test double: a scripted in-memory [`Transport`] that records
//! every call it receives.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use search_ext::{Error, Page, QueryTarget, Result, Transport};

/// Build a raw page response with realistic metadata fields.
#[allow(dead_code)]
pub fn page(scroll_id: &str, total: u64, ids: &[&str]) -> Value {
    let hits: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "_id": id, "_source": { "name": id } }))
        .collect();
    json!({
        "_scroll_id": scroll_id,
        "took": 7,
        "timed_out": false,
        "_shards": { "total": 3, "successful": 3, "failed": 0 },
        "hits": { "total": total, "max_score": 1.0, "hits": hits }
    })
}

#[derive(Default)]
pub struct MockTransport {
    /// Pages returned in order: the first answers `execute_query`, the
    /// rest answer successive `advance_cursor` calls.
    pub pages: Mutex<VecDeque<Value>>,
    pub queries: Mutex<Vec<(Option<String>, String)>>,
    pub advances: Mutex<Vec<(String, String)>>,
    pub releases: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<(String, BTreeMap<String, String>)>>,
    pub fail_release: bool,
    /// When set, `submit_batch` refuses the request with a 503.
    pub fail_submit: AtomicBool,
}

impl MockTransport {
    pub fn with_pages(pages: Vec<Value>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    fn next_page(&self) -> Result<Page> {
        let raw = self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock transport ran out of scripted pages");
        Page::from_value(raw)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute_query(
        &self,
        target: &QueryTarget,
        _body: &Value,
        scroll: &str,
    ) -> Result<Page> {
        self.queries
            .lock()
            .unwrap()
            .push((target.index.clone(), scroll.to_string()));
        self.next_page()
    }

    async fn advance_cursor(&self, scroll_id: &str, scroll: &str) -> Result<Page> {
        self.advances
            .lock()
            .unwrap()
            .push((scroll_id.to_string(), scroll.to_string()));
        self.next_page()
    }

    async fn release_cursor(&self, scroll_id: &str) -> Result<()> {
        if self.fail_release {
            return Err(Error::Api {
                status: 404,
                body: "no such cursor".to_string(),
            });
        }
        self.releases.lock().unwrap().push(scroll_id.to_string());
        Ok(())
    }

    async fn submit_batch(
        &self,
        body: String,
        params: &BTreeMap<String, String>,
    ) -> Result<Value> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                body: "engine overloaded".to_string(),
            });
        }
        let items: Vec<Value> = body
            .lines()
            .map(|line| json!({ "status": 200, "line": line }))
            .collect();
        self.batches.lock().unwrap().push((body, params.clone()));
        Ok(json!({ "took": 3, "errors": false, "items": items }))
    }
}
