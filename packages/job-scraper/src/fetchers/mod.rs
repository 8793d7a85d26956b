//! Fetch layer implementations.
//!
//! - `HttpTransport` - single reqwest GET with session-wide default headers
//! - `PoliteFetcher` - per-domain spacing, retries and backoff over any transport

pub mod http;
pub mod polite;

pub use http::{random_browser_agent, HttpTransport, BROWSER_USER_AGENTS};
pub use polite::PoliteFetcher;
