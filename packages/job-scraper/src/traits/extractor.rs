//! Source extractor trait: one portal (or the search fallback) per implementation.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::types::job::JobRecord;

/// Turns one search category into job records from a single source.
///
/// Implementations fetch their own pages through the shared
/// [`PoliteFetcher`](crate::fetchers::PoliteFetcher). Unreachable pages and
/// malformed records are skipped inside the extractor; an `Err` means the
/// whole source failed for this category, and the aggregator contains it.
#[async_trait]
pub trait SourceExtractor: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>>;
}
