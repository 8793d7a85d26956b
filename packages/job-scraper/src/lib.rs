//! Polite Multi-Source Job Scraper
//!
//! Aggregates job postings for a list of search categories from several
//! Chilean job portals plus a search-engine fallback, normalizes them into
//! one record shape, deduplicates them, and keeps the result behind a TTL
//! cache.
//!
//! # Design
//!
//! - Every request goes through one shared [`PoliteFetcher`]: per-domain
//!   spacing, retries with backoff, `Retry-After` honored
//! - Extractors parse with pure functions so markup drift is caught by
//!   fixture tests, not in production
//! - Failures are contained at the record, page and source level; the worst
//!   case is stale or empty data, never an error to the caller
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use job_scraper::{Aggregator, CacheConfig, FetcherConfig, HttpTransport, JobCache, PoliteFetcher, ScrapeConfig};
//!
//! let fetcher_config = FetcherConfig::default();
//! let transport = HttpTransport::new(&fetcher_config)?;
//! let fetcher = Arc::new(PoliteFetcher::new(Arc::new(transport), fetcher_config));
//!
//! let aggregator = Aggregator::from_config(fetcher, &ScrapeConfig::default());
//! let cache = JobCache::new(aggregator, CacheConfig::default());
//!
//! let read = cache.get_jobs(false).await;
//! println!("{} jobs ({})", read.jobs.len(), read.status.as_str());
//! ```
//!
//! # Modules
//!
//! - [`normalize`] - text cleanup, link canonicalization, freshness parsing
//! - [`fetchers`] - HTTP transport and the polite fetch layer
//! - [`extractors`] - per-portal parsers and the search fallback
//! - [`pipeline`] - deduplication and the aggregation run
//! - [`cache`] - TTL cache with single-flight refresh
//! - [`security`] - SSRF guard for detail-page visits
//! - [`testing`] - Mock transport, clock and aggregate source

pub mod cache;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod normalize;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use cache::{CacheRead, CacheSnapshot, CacheStatus, JobCache, RefreshOutcome};
pub use error::{AggregateError, ExtractError, FetchError, SecurityError};
pub use extractors::{default_extractors, DetailEnricher, SearchExtractor};
pub use fetchers::{HttpTransport, PoliteFetcher};
pub use normalize::{canonicalize, clean_text, parse_relative_age};
pub use pipeline::{dedupe, AggregateReport, Aggregator};
pub use security::LinkGuard;
pub use traits::{
    aggregate::AggregateSource,
    clock::{Clock, SystemClock},
    extractor::SourceExtractor,
    transport::Transport,
};
pub use types::{
    config::{CacheConfig, FetcherConfig, ScrapeConfig, DEFAULT_CATEGORIES},
    job::{JobRecord, Source},
    page::{FetchRequest, FetchedPage},
};
