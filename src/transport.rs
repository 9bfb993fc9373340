//! Wire-client collaborator seam.
//!
//! The scroll iterator and the bulk aggregator consume the engine
//! through the four operations of [`Transport`] and nothing else. The
//! built-in implementation is [`HttpTransport`], a thin reqwest client
//! over the engine's REST routes; tests and alternative backends supply
//! their own implementation.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::page::Page;

/// Addressing for the initial query: which index and document type to
/// search. An absent index searches all indices.
#[derive(Debug, Clone, Default)]
pub struct QueryTarget {
    pub index: Option<String>,
    pub doc_type: Option<String>,
}

impl QueryTarget {
    /// The request path for this target: `/{index|_all}[/{doc_type}]/_search`.
    pub fn search_path(&self) -> String {
        let index = self.index.as_deref().unwrap_or("_all");
        match self.doc_type.as_deref() {
            Some(doc_type) => format!("/{index}/{doc_type}/_search"),
            None => format!("/{index}/_search"),
        }
    }

    /// The bulk request path for this target. The engine takes the
    /// batch's default index and document type as path segments, not
    /// query parameters: `/{index}[/{doc_type}]/_bulk`, or bare
    /// `/_bulk` when neither is set.
    pub fn bulk_path(&self) -> String {
        match (self.index.as_deref(), self.doc_type.as_deref()) {
            (None, None) => "/_bulk".to_string(),
            (index, Some(doc_type)) => {
                format!("/{}/{doc_type}/_bulk", index.unwrap_or("_all"))
            }
            (Some(index), None) => format!("/{index}/_bulk"),
        }
    }
}

/// The four engine operations the extension layer depends on.
///
/// Implementations must not retry or reorder; retry policy belongs to
/// the caller's transport stack, not here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run the initial query with a cursor lifetime, returning the
    /// first page and the engine's declared total.
    async fn execute_query(&self, target: &QueryTarget, body: &Value, scroll: &str)
        -> Result<Page>;

    /// Fetch the next page for an open cursor.
    async fn advance_cursor(&self, scroll_id: &str, scroll: &str) -> Result<Page>;

    /// Release a cursor the engine is still holding.
    async fn release_cursor(&self, scroll_id: &str) -> Result<()>;

    /// Submit a rendered bulk body with its request parameters and
    /// return the engine's per-action response.
    async fn submit_batch(&self, body: String, params: &BTreeMap<String, String>)
        -> Result<Value>;
}

/// HTTP implementation of [`Transport`] over the engine's REST API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let auth = match (&config.username, &config.password) {
            (Some(user), password) => {
                Some((user.clone(), password.clone().unwrap_or_default()))
            }
            _ => None,
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn read_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), body));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute_query(
        &self,
        target: &QueryTarget,
        body: &Value,
        scroll: &str,
    ) -> Result<Page> {
        let response = self
            .request(reqwest::Method::POST, &target.search_path())
            .query(&[("scroll", scroll)])
            .json(body)
            .send()
            .await?;
        Page::from_value(Self::read_json(response).await?)
    }

    async fn advance_cursor(&self, scroll_id: &str, scroll: &str) -> Result<Page> {
        let response = self
            .request(reqwest::Method::POST, "/_search/scroll")
            .query(&[("scroll", scroll)])
            .json(&json!({ "scroll_id": scroll_id }))
            .send()
            .await?;
        Page::from_value(Self::read_json(response).await?)
    }

    async fn release_cursor(&self, scroll_id: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, "/_search/scroll")
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await?;
        Self::read_json(response).await.map(|_| ())
    }

    async fn submit_batch(
        &self,
        body: String,
        params: &BTreeMap<String, String>,
    ) -> Result<Value> {
        // Addressing defaults go into the path; only behavior
        // parameters travel in the query string.
        let target = QueryTarget {
            index: params.get("index").cloned(),
            doc_type: params.get("doc_type").cloned(),
        };
        let query: Vec<(&str, &str)> = params
            .iter()
            .filter(|(key, _)| key.as_str() != "index" && key.as_str() != "doc_type")
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();

        let response = self
            .request(reqwest::Method::POST, &target.bulk_path())
            .query(&query)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        Self::read_json(response).await
    }
}
