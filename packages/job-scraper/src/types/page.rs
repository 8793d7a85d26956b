//! Request and response shapes exchanged with the fetch layer.

use std::collections::HashMap;
use std::time::Duration;

/// Status codes that are retried with backoff.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// A single GET request, before politeness and retries are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Absolute URL without the query parameters below
    pub url: String,

    /// Query parameters, appended in order
    pub query: Vec<(String, String)>,

    /// Extra headers merged over the session defaults
    pub headers: Vec<(String, String)>,

    /// Overall deadline for this request, on top of the session timeouts
    pub timeout: Option<Duration>,

    /// Attempt budget override
    pub max_retries: Option<u32>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout: None,
            max_retries: None,
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Bound the whole request, including the body download.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the attempt budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Lowercased host this request is rate limited under.
    pub fn domain(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|host| host.to_lowercase()))
    }
}

/// A fetched HTTP response, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,

    /// Response body as text
    pub body: String,
}

impl FetchedPage {
    /// Create a page; the final URL starts out equal to the requested one.
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Set the post-redirect URL.
    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    /// Add a response header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Only a plain 200 counts as a usable listing page.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Throttling or transient server error.
    pub fn is_retryable(&self) -> bool {
        RETRYABLE_STATUSES.contains(&self.status)
    }

    /// `Retry-After` when it is a plain number of seconds.
    ///
    /// HTTP-date values are ignored and fall back to backoff.
    pub fn retry_after(&self) -> Option<Duration> {
        let value = self.headers.get("retry-after")?.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = FetchRequest::new("https://CL.Indeed.com/jobs")
            .with_query("q", "Planner")
            .with_query("start", "0")
            .with_header("User-Agent", "test")
            .with_max_retries(2);

        assert_eq!(request.domain(), Some("cl.indeed.com".to_string()));
        assert_eq!(request.query.len(), 2);
        assert_eq!(request.max_retries, Some(2));
        assert!(FetchRequest::new("not a url").domain().is_none());
    }

    #[test]
    fn test_retry_after_plain_seconds_only() {
        let page = FetchedPage::new("https://x.cl", 429, "").with_header("Retry-After", "7");
        assert_eq!(page.retry_after(), Some(Duration::from_secs(7)));

        let dated = FetchedPage::new("https://x.cl", 429, "")
            .with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(dated.retry_after(), None);

        let negative = FetchedPage::new("https://x.cl", 503, "").with_header("retry-after", "-1");
        assert_eq!(negative.retry_after(), None);
    }

    #[test]
    fn test_status_classes() {
        assert!(FetchedPage::new("https://x.cl", 200, "").is_success());
        assert!(!FetchedPage::new("https://x.cl", 204, "").is_success());
        for status in [429, 500, 502, 503, 504] {
            assert!(FetchedPage::new("https://x.cl", status, "").is_retryable());
        }
        assert!(!FetchedPage::new("https://x.cl", 404, "").is_retryable());
    }
}
