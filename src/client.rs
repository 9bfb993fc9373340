//! Client façade tying configuration, transport, and the two extension
//! APIs together.

use std::sync::Arc;

use crate::bulk::{BulkDefaults, BulkOperation};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::scan::{Scan, ScanOptions};
use crate::transport::{HttpTransport, Transport};

/// Entry point for iterated search and bulk operations.
///
/// Wraps a [`Transport`] by composition rather than inheriting a
/// general-purpose client; anything implementing the trait can stand in
/// for the HTTP backend.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
}

impl SearchClient {
    /// Connect over HTTP using the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(HttpTransport::new(&config)?),
        })
    }

    /// Use a caller-supplied transport (custom backend or test double).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Open an iterated search. Fails before any network call if the
    /// mandatory scroll duration is missing.
    pub fn scan(&self, options: ScanOptions) -> Result<Scan> {
        Scan::new(self.transport.clone(), options)
    }

    /// Create an aggregator for one batch of write operations.
    pub fn bulk(&self, defaults: BulkDefaults) -> BulkOperation {
        BulkOperation::new(self.transport.clone(), defaults)
    }
}
