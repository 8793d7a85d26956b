//! Typed errors for the job scraper library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors raised by a single HTTP request (after retries are exhausted).
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or has no host
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connect or read timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Connection, TLS, or protocol failure
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Response arrived but the body could not be read
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// HTTP client could not be constructed
    #[error("client setup failed: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// URL rejected by the request guard
    #[error("blocked URL: {0}")]
    Security(#[from] SecurityError),
}

/// Errors raised by a source extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Underlying fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Page answered with something other than 200
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// A CSS selector failed to parse
    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Errors raised by a whole aggregation run.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Nothing to scrape
    #[error("no extractors or categories configured")]
    NoSources,

    /// Source failed outright
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Failure reported by an external aggregate source
    #[error("aggregation failed: {0}")]
    Failed(String),
}

/// Errors from URL safety checks before fetching third-party pages.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extractor operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for aggregation runs.
pub type AggregateResult<T> = std::result::Result<T, AggregateError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
