//! Core trait abstractions for the job scraper.
//!
//! These are the seams the pipeline is injected through: the HTTP transport,
//! the clock used for politeness waits, the per-portal extractors, and the
//! aggregate source behind the cache.

pub mod aggregate;
pub mod clock;
pub mod extractor;
pub mod transport;
