//! Aggregate source trait: whatever produces the full job list for the cache.

use async_trait::async_trait;

use crate::error::AggregateResult;
use crate::types::job::JobRecord;

/// Produces a complete, deduplicated, id-tagged job list.
///
/// Implemented by [`Aggregator`](crate::pipeline::Aggregator); tests use
/// [`MockAggregateSource`](crate::testing::MockAggregateSource).
#[async_trait]
pub trait AggregateSource: Send + Sync {
    async fn aggregate(&self) -> AggregateResult<Vec<JobRecord>>;
}
