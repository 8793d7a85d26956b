//! Transport trait: one HTTP request, no politeness or retries.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::page::{FetchRequest, FetchedPage};

/// Sends a single GET request.
///
/// Any HTTP status is a successful send; only transport-level failures
/// (connect, TLS, timeout, unreadable body) are errors. Politeness delays and
/// retries live in [`PoliteFetcher`](crate::fetchers::PoliteFetcher), which
/// wraps a transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> FetchResult<FetchedPage>;

    /// Get the transport name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
