//! One response to a query or cursor-advance call.
//!
//! A [`Page`] keeps the engine's raw JSON response intact and parses the
//! three fields the scroll protocol needs up front: the declared total,
//! the scroll token, and the record array. [`Page::meta`] returns
//! everything else verbatim for `with_meta` iteration.

use serde_json::Value;

use crate::error::{Error, Result};

/// A parsed engine response holding one slice of records plus metadata.
#[derive(Debug, Clone)]
pub struct Page {
    raw: Value,
    total: u64,
    scroll_id: String,
}

impl Page {
    /// Parse a raw engine response.
    ///
    /// Requires `_scroll_id`, `hits.hits` (an array), and `hits.total`.
    /// The total is accepted in both wire shapes the engine has used:
    /// a bare integer or `{"value": n, "relation": ...}`.
    pub fn from_value(raw: Value) -> Result<Self> {
        let scroll_id = raw
            .get("_scroll_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::response("missing _scroll_id"))?
            .to_string();

        let hits = raw
            .get("hits")
            .ok_or_else(|| Error::response("missing hits"))?;
        if !hits.get("hits").map(Value::is_array).unwrap_or(false) {
            return Err(Error::response("hits.hits is not an array"));
        }

        let total = match hits.get("total") {
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| Error::response("hits.total is not a non-negative integer"))?,
            Some(Value::Object(obj)) => obj
                .get("value")
                .and_then(|v| v.as_u64())
                .ok_or_else(|| Error::response("hits.total.value is not a non-negative integer"))?,
            _ => return Err(Error::response("missing hits.total")),
        };

        Ok(Self {
            raw,
            total,
            scroll_id,
        })
    }

    /// Total number of records matching the query, as declared by the
    /// engine on this page.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The scroll token to supply on the next cursor-advance call.
    pub fn scroll_id(&self) -> &str {
        &self.scroll_id
    }

    /// The records on this page, in engine order.
    pub fn hits(&self) -> &[Value] {
        self.raw["hits"]["hits"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of records on this page.
    pub fn len(&self) -> usize {
        self.hits().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits().is_empty()
    }

    /// The full response with the record array removed: shard status,
    /// timing, score info, and any other top-level field pass through
    /// unchanged.
    pub fn meta(&self) -> Value {
        let mut meta = self.raw.clone();
        if let Some(hits) = meta.get_mut("hits").and_then(Value::as_object_mut) {
            hits.remove("hits");
        }
        meta
    }

    /// Consume the page and return the record array.
    pub fn into_hits(mut self) -> Vec<Value> {
        self.raw["hits"]["hits"]
            .as_array_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}
