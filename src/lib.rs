//! # search-ext
//!
//! An extension layer over a document search engine's HTTP API, adding
//! two capabilities the base API makes tedious to use directly:
//!
//! - **Iterated search** — transparent, resumable iteration over
//!   arbitrarily large result sets using the engine's scrolling cursor
//!   protocol, with exhaustion accounting and automatic cursor release.
//! - **Bulk operations** — an accumulator that records writes (upsert,
//!   create, update, delete) one call at a time and submits them as a
//!   single request in the engine's line-delimited bulk format.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐      ┌───────────────────────────┐
//! │ SearchClient │─────▶│ Transport (trait)          │
//! └──────┬───────┘      │  execute_query             │
//!        │              │  advance_cursor            │
//!   ┌────┴─────┐        │  release_cursor            │
//!   ▼          ▼        │  submit_batch              │
//! ┌──────┐ ┌────────┐   └──────────┬────────────────┘
//! │ Scan │ │ BulkOp │              ▼
//! └──────┘ └────────┘       HTTP engine API
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_ext::{SearchClient, ScanOptions, ClientConfig};
//! use serde_json::json;
//!
//! # async fn example() -> search_ext::Result<()> {
//! let client = SearchClient::new(ClientConfig::default())?;
//!
//! let mut scan = client.scan(ScanOptions {
//!     index: Some("tweets".to_string()),
//!     body: json!({ "query": { "match_all": {} } }),
//!     scroll: Some("5m".to_string()),
//!     ..ScanOptions::default()
//! })?;
//!
//! while let Some(step) = scan.next_step().await? {
//!     for record in step.payload.as_records() {
//!         println!("{}", record["_id"]);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML client configuration |
//! | [`error`] | Error taxonomy |
//! | [`transport`] | Engine collaborator trait + HTTP implementation |
//! | [`page`] | Response page wrapper |
//! | [`scan`] | Iterated search over a scrolling cursor |
//! | [`bulk`] | Batched write operations |
//! | [`client`] | Client façade |

pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod page;
pub mod scan;
pub mod transport;

pub use bulk::{ActionKind, ActionParams, BulkAction, BulkDefaults, BulkOperation};
pub use client::SearchClient;
pub use config::{load_config, ClientConfig};
pub use error::{Error, Result};
pub use page::Page;
pub use scan::{Scan, ScanOptions, ScanPayload, ScanStep};
pub use transport::{HttpTransport, QueryTarget, Transport};
