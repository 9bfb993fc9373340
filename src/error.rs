//! Error types for scroll iteration and bulk submission.
//!
//! Callers match on [`Error`] to distinguish precondition failures
//! ([`Error::InvalidArgument`], [`Error::InvalidBulkAction`]) from a
//! corrupted scroll session ([`Error::IncompleteScroll`]) and from
//! transport- or engine-level failures, which are propagated unchanged.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required parameter was missing or malformed. Detected before
    /// any network call and never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An action could not be recorded: unknown kind, or a kind that
    /// requires a body was given none. The aggregator is unchanged.
    #[error("invalid bulk action: {0}")]
    InvalidBulkAction(String),

    /// The engine reported exhaustion before delivering as many records
    /// as its own declared total. The cursor is deliberately left open
    /// so an operator can inspect it.
    #[error(
        "incomplete scroll: engine declared {expected} matching records but \
         {retrieved} were retrieved; last scroll id with records: {last_scroll_id}; \
         final scroll id: {final_scroll_id}"
    )]
    IncompleteScroll {
        expected: u64,
        retrieved: u64,
        last_scroll_id: String,
        final_scroll_id: String,
    },

    /// Transport-level failure (connection, timeout, TLS).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("engine error {status}: {body}")]
    Api { status: u16, body: String },

    /// The engine's payload could not be parsed or was missing a
    /// required field.
    #[error("unexpected engine response: {0}")]
    Response(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub(crate) fn response(message: impl Into<String>) -> Self {
        Self::Response(message.into())
    }
}
