// Job Aggregator - API Core
//
// Thin HTTP layer over the job-scraper cache: configuration, routes and the
// background refresh schedule. All scraping logic lives in job-scraper.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
