//! Batched write operations.
//!
//! A [`BulkOperation`] accumulates write intents — upsert, conditional
//! create, partial update, delete — and submits them as one request in
//! the engine's line-delimited bulk format. Each recording call appends
//! one immutable [`BulkAction`]; [`flush`](BulkOperation::flush)
//! renders everything pending, submits it, and clears the list in one
//! step.
//!
//! Actions are validated when recorded, not when flushed: a kind that
//! requires a document body must be given one, and a delete discards
//! any body it is handed.
//!
//! # Example
//!
//! ```rust,no_run
//! # use search_ext::{SearchClient, ClientConfig, BulkDefaults, ActionParams};
//! # use serde_json::json;
//! # async fn example() -> search_ext::Result<()> {
//! let client = SearchClient::new(ClientConfig::default())?;
//! let bulk = client.bulk(BulkDefaults {
//!     index: Some("tweets".to_string()),
//!     ..BulkDefaults::default()
//! });
//!
//! bulk.index(json!({ "text": "hello" }), None, ActionParams::default())?;
//! bulk.delete("stale-id", ActionParams::default())?;
//!
//! let response = bulk.flush(None).await?;
//! println!("{}", response["items"]);
//! # Ok(())
//! # }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// The closed set of bulk action kinds the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Upsert: create the document or replace an existing one.
    Index,
    /// Create only if no document with the id exists.
    Create,
    /// Partial update of an existing document.
    Update,
    /// Remove a document.
    Delete,
}

impl ActionKind {
    /// The kind's name on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ActionKind::Index => "index",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }

    /// Whether actions of this kind carry a document body on the line
    /// after the header.
    pub fn requires_body(&self) -> bool {
        !matches!(self, ActionKind::Delete)
    }
}

/// Per-action addressing and behavior overrides.
///
/// The recognized keys are enumerated as typed fields; anything else
/// cannot be expressed. `index`, `doc_type`, and `id` are renamed to
/// the engine's wire-level field names when the action is recorded,
/// and every other field passes through under its own name.
#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    pub index: Option<String>,
    pub doc_type: Option<String>,
    pub id: Option<String>,
    pub routing: Option<String>,
    pub parent: Option<String>,
    pub consistency: Option<String>,
    pub refresh: Option<bool>,
    pub replication: Option<String>,
    pub ttl: Option<String>,
    pub timeout: Option<String>,
    pub version: Option<i64>,
    pub version_type: Option<String>,
}

impl ActionParams {
    /// Build the wire-level header fields for this action. Constructs a
    /// fresh map; the caller-supplied struct is never mutated.
    fn to_wire(&self) -> Map<String, Value> {
        let mut wire = Map::new();
        if let Some(index) = &self.index {
            wire.insert("_index".to_string(), Value::from(index.clone()));
        }
        if let Some(doc_type) = &self.doc_type {
            wire.insert("_type".to_string(), Value::from(doc_type.clone()));
        }
        if let Some(id) = &self.id {
            wire.insert("_id".to_string(), Value::from(id.clone()));
        }
        if let Some(routing) = &self.routing {
            wire.insert("routing".to_string(), Value::from(routing.clone()));
        }
        if let Some(parent) = &self.parent {
            wire.insert("parent".to_string(), Value::from(parent.clone()));
        }
        if let Some(consistency) = &self.consistency {
            wire.insert("consistency".to_string(), Value::from(consistency.clone()));
        }
        if let Some(refresh) = self.refresh {
            wire.insert("refresh".to_string(), Value::from(refresh));
        }
        if let Some(replication) = &self.replication {
            wire.insert("replication".to_string(), Value::from(replication.clone()));
        }
        if let Some(ttl) = &self.ttl {
            wire.insert("ttl".to_string(), Value::from(ttl.clone()));
        }
        if let Some(timeout) = &self.timeout {
            wire.insert("timeout".to_string(), Value::from(timeout.clone()));
        }
        if let Some(version) = self.version {
            wire.insert("version".to_string(), Value::from(version));
        }
        if let Some(version_type) = &self.version_type {
            wire.insert("version_type".to_string(), Value::from(version_type.clone()));
        }
        wire
    }
}

/// One recorded write intent. Immutable once appended.
#[derive(Debug, Clone)]
pub struct BulkAction {
    kind: ActionKind,
    params: Map<String, Value>,
    body: Option<Value>,
}

impl BulkAction {
    /// Record an action. A kind that requires a body must be given one;
    /// a delete discards any body it is handed rather than serializing
    /// it.
    pub fn new(kind: ActionKind, params: Map<String, Value>, body: Option<Value>) -> Result<Self> {
        // A JSON null is no document at all.
        let body = body.filter(|b| !b.is_null());
        if kind.requires_body() && body.is_none() {
            return Err(Error::InvalidBulkAction(format!(
                "'{}' actions require a document body",
                kind.wire_name()
            )));
        }

        Ok(Self {
            kind,
            params,
            body: if kind.requires_body() { body } else { None },
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Serialize to the engine's line format: a header line, then the
    /// body line for body-bearing kinds.
    pub fn render(&self) -> Result<String> {
        let mut header = Map::new();
        header.insert(
            self.kind.wire_name().to_string(),
            Value::Object(self.params.clone()),
        );

        let mut rendered = serde_json::to_string(&Value::Object(header))?;
        if let Some(body) = &self.body {
            rendered.push('\n');
            rendered.push_str(&serde_json::to_string(body)?);
        }
        Ok(rendered)
    }
}

/// Defaults applied to a whole batch: request-level parameters for the
/// submit call, set at aggregator creation and overridable at flush.
#[derive(Debug, Clone, Default)]
pub struct BulkDefaults {
    pub index: Option<String>,
    pub doc_type: Option<String>,
    pub consistency: Option<String>,
    pub refresh: Option<bool>,
    pub routing: Option<String>,
    pub replication: Option<String>,
    pub timeout: Option<String>,
}

impl BulkDefaults {
    /// Render to request parameters for the submit call.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(index) = &self.index {
            params.insert("index".to_string(), index.clone());
        }
        if let Some(doc_type) = &self.doc_type {
            params.insert("doc_type".to_string(), doc_type.clone());
        }
        if let Some(consistency) = &self.consistency {
            params.insert("consistency".to_string(), consistency.clone());
        }
        if let Some(refresh) = self.refresh {
            params.insert("refresh".to_string(), refresh.to_string());
        }
        if let Some(routing) = &self.routing {
            params.insert("routing".to_string(), routing.clone());
        }
        if let Some(replication) = &self.replication {
            params.insert("replication".to_string(), replication.clone());
        }
        if let Some(timeout) = &self.timeout {
            params.insert("timeout".to_string(), timeout.clone());
        }
        params
    }
}

/// Accumulator for one batch of write operations.
///
/// One aggregator owns one accumulating batch. Recording calls append
/// under a lock, and [`flush`](BulkOperation::flush) snapshots and
/// clears the pending list as one indivisible step, so an aggregator
/// shared across tasks never drops or double-submits a record.
pub struct BulkOperation {
    transport: Arc<dyn Transport>,
    defaults: BulkDefaults,
    pending: Mutex<Vec<BulkAction>>,
}

impl BulkOperation {
    pub fn new(transport: Arc<dyn Transport>, defaults: BulkDefaults) -> Self {
        Self {
            transport,
            defaults,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Record an upsert. The engine generates an id when none is given.
    pub fn index(&self, body: Value, id: Option<&str>, params: ActionParams) -> Result<()> {
        self.record(ActionKind::Index, Some(body), id, params)
    }

    /// Record a create that fails on the engine if the id already
    /// exists. The engine generates an id when none is given.
    pub fn create(&self, body: Value, id: Option<&str>, params: ActionParams) -> Result<()> {
        self.record(ActionKind::Create, Some(body), id, params)
    }

    /// Record a partial update of the document with `id`.
    pub fn update(&self, id: &str, body: Value, params: ActionParams) -> Result<()> {
        self.record(ActionKind::Update, Some(body), Some(id), params)
    }

    /// Record a delete of the document with `id`. Deletes never carry a
    /// body.
    pub fn delete(&self, id: &str, params: ActionParams) -> Result<()> {
        self.record(ActionKind::Delete, None, Some(id), params)
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.pending.lock().expect("bulk pending lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(
        &self,
        kind: ActionKind,
        body: Option<Value>,
        id: Option<&str>,
        params: ActionParams,
    ) -> Result<()> {
        let mut params = params;
        if let Some(id) = id {
            params.id = Some(id.to_string());
        }

        // Validate before touching the pending list: a rejected action
        // leaves the aggregator unchanged.
        let action = BulkAction::new(kind, params.to_wire(), body)?;

        self.pending
            .lock()
            .expect("bulk pending lock poisoned")
            .push(action);
        Ok(())
    }

    /// Render and submit every pending action as one request, then
    /// clear the pending list. Flush-time parameters override the
    /// aggregator's defaults key by key.
    ///
    /// The list is only cleared for good once the engine accepted the
    /// batch: on a failed submission the snapshot goes back to the
    /// front of the pending list, ahead of anything recorded while the
    /// request was in flight, so the caller can retry the flush.
    ///
    /// Returns the engine's response, including its per-action `items`
    /// array, unmodified.
    pub async fn flush(&self, overrides: Option<&BulkDefaults>) -> Result<Value> {
        let actions = {
            let mut pending = self.pending.lock().expect("bulk pending lock poisoned");
            std::mem::take(&mut *pending)
        };

        if actions.is_empty() {
            return Err(Error::InvalidArgument(
                "no bulk actions recorded; nothing to flush".to_string(),
            ));
        }

        match self.submit(&actions, overrides).await {
            Ok(response) => Ok(response),
            Err(e) => {
                let mut pending = self.pending.lock().expect("bulk pending lock poisoned");
                let appended = std::mem::take(&mut *pending);
                *pending = actions;
                pending.extend(appended);
                Err(e)
            }
        }
    }

    async fn submit(
        &self,
        actions: &[BulkAction],
        overrides: Option<&BulkDefaults>,
    ) -> Result<Value> {
        let mut body = String::with_capacity(actions.len() * 64);
        for action in actions {
            body.push_str(&action.render()?);
            body.push('\n');
        }

        let mut params = self.defaults.to_params();
        if let Some(overrides) = overrides {
            params.extend(overrides.to_params());
        }

        debug!(actions = actions.len(), "submitting bulk batch");
        self.transport.submit_batch(body, &params).await
    }
}
