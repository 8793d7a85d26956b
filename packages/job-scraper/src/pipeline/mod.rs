//! Aggregation pipeline.
//!
//! - [`dedupe`] - order-preserving deduplication by canonical link
//! - [`Aggregator`] - categories × extractors, contained failures, final ids

pub mod aggregate;
pub mod dedupe;

pub use aggregate::{AggregateReport, Aggregator, SourceFailure, SourceStats};
pub use dedupe::dedupe;
