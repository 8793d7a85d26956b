//! Polite fetcher: per-domain spacing, retries and backoff.
//!
//! Wraps any [`Transport`] the way a rate limiter wraps a crawler, but keyed by
//! host: each domain gets a minimum gap between requests, and throttling or
//! transient server errors are retried with exponential backoff.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::transport::Transport;
use crate::types::config::FetcherConfig;
use crate::types::page::{FetchRequest, FetchedPage};

/// Last request time for one domain, locked for the whole wait + attempt loop.
type DomainSlot = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// Shared, process-wide fetcher.
///
/// Build one and share it through an `Arc`: the per-domain timestamps it
/// keeps are what spaces requests across every extractor and category.
pub struct PoliteFetcher {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: FetcherConfig,
    domains: Mutex<HashMap<String, DomainSlot>>,
}

impl PoliteFetcher {
    /// Create a fetcher on real time.
    pub fn new(transport: Arc<dyn Transport>, config: FetcherConfig) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
            config,
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Use a different clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// When the last request to `domain` completed, if any.
    pub async fn last_request(&self, domain: &str) -> Option<Instant> {
        let slot = self.slot(&domain.to_lowercase());
        let last = slot.lock().await;
        *last
    }

    /// Fetch with politeness delay and retries.
    ///
    /// Returns the first non-retryable response, or after the attempt budget
    /// is spent, the last response or transport error. Callers must check the
    /// status before using the body.
    pub async fn fetch(&self, request: FetchRequest) -> FetchResult<FetchedPage> {
        let domain = request.domain().ok_or_else(|| FetchError::InvalidUrl {
            url: request.url.clone(),
        })?;

        let slot = self.slot(&domain);
        let mut last = slot.lock().await;

        if let Some(previous) = *last {
            let min_delay = self.config.delay_for(&domain);
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < min_delay {
                let wait = min_delay - elapsed + jitter(self.config.politeness_jitter);
                debug!(domain = %domain, wait_ms = wait.as_millis() as u64, "Waiting before request");
                self.clock.sleep(wait).await;
            }
        }

        let attempts = request.max_retries.unwrap_or(self.config.max_retries).max(1);
        let mut backoff = self.config.backoff_initial;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = self.transport.send(&request).await;
            *last = Some(self.clock.now());

            let retry_hint = match &result {
                Ok(page) if !page.is_retryable() => return result,
                Ok(page) => page.retry_after(),
                Err(_) => None,
            };

            if attempt >= attempts {
                match &result {
                    Ok(page) => warn!(
                        url = %request.url,
                        status = page.status,
                        attempts,
                        "Giving up, returning last error response"
                    ),
                    Err(e) => warn!(url = %request.url, error = %e, attempts, "Giving up after transport errors"),
                }
                return result;
            }

            let pause = retry_hint.unwrap_or_else(|| backoff + jitter(self.config.backoff_jitter));
            match &result {
                Ok(page) => warn!(
                    url = %request.url,
                    status = page.status,
                    attempt,
                    pause_ms = pause.as_millis() as u64,
                    "Retryable status, backing off"
                ),
                Err(e) => warn!(
                    url = %request.url,
                    error = %e,
                    attempt,
                    pause_ms = pause.as_millis() as u64,
                    "Request failed, backing off"
                ),
            }
            self.clock.sleep(pause).await;
            backoff = backoff.mul_f64(self.config.backoff_factor);
        }
    }

    fn slot(&self, domain: &str) -> DomainSlot {
        let mut domains = self
            .domains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        domains
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }
}

/// Uniform random duration in `[low, high]`.
fn jitter((low, high): (Duration, Duration)) -> Duration {
    if high <= low {
        return low;
    }
    low + (high - low).mul_f64(fastrand::f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClock, MockReply, MockTransport};

    const NO_JITTER: (Duration, Duration) = (Duration::ZERO, Duration::ZERO);

    fn config() -> FetcherConfig {
        FetcherConfig::new()
            .without_domain_delays()
            .with_default_delay(Duration::from_secs(10))
            .with_domain_delay("slow.example.cl", Duration::from_secs(15))
            .with_jitter(NO_JITTER, NO_JITTER)
    }

    fn fetcher(transport: Arc<MockTransport>, clock: Arc<MockClock>) -> PoliteFetcher {
        PoliteFetcher::new(transport, config()).with_clock(clock)
    }

    #[tokio::test]
    async fn test_same_domain_calls_are_spaced() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new()
                .with_clock(clock.clone())
                .with_page("https://slow.example.cl/", 200, "ok"),
        );
        let fetcher = fetcher(transport.clone(), clock.clone());

        fetcher.fetch(FetchRequest::new("https://slow.example.cl/a")).await.unwrap();
        fetcher.fetch(FetchRequest::new("https://slow.example.cl/b")).await.unwrap();

        let times = transport.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1].duration_since(times[0]) >= Duration::from_secs(15));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn test_partial_wait_after_elapsed_time() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(MockTransport::new().with_page("https://a.example.cl/", 200, "ok"));
        let fetcher = fetcher(transport, clock.clone());

        fetcher.fetch(FetchRequest::new("https://a.example.cl/1")).await.unwrap();
        clock.advance(Duration::from_secs(4));
        fetcher.fetch(FetchRequest::new("https://a.example.cl/2")).await.unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(6)]);
    }

    #[tokio::test]
    async fn test_different_domains_do_not_wait() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new()
                .with_page("https://a.example.cl/", 200, "a")
                .with_page("https://b.example.cl/", 200, "b"),
        );
        let fetcher = fetcher(transport, clock.clone());

        fetcher.fetch(FetchRequest::new("https://a.example.cl/")).await.unwrap();
        fetcher.fetch(FetchRequest::new("https://B.example.cl/")).await.unwrap();

        assert!(clock.sleeps().is_empty());
        assert!(fetcher.last_request("b.example.cl").await.is_some());
    }

    #[tokio::test]
    async fn test_retries_with_backoff_then_succeeds() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new()
                .with_reply("https://a.example.cl/", MockReply::status(503))
                .with_reply("https://a.example.cl/", MockReply::status(502))
                .with_reply("https://a.example.cl/", MockReply::page(200, "finally")),
        );
        let fetcher = PoliteFetcher::new(
            transport.clone(),
            config().with_backoff(Duration::from_secs(4), 2.0),
        )
        .with_clock(clock.clone());

        let page = fetcher.fetch(FetchRequest::new("https://a.example.cl/")).await.unwrap();

        assert_eq!(page.body, "finally");
        assert_eq!(transport.call_count(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(4), Duration::from_secs(8)]);
    }

    #[tokio::test]
    async fn test_honors_retry_after() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new()
                .with_reply(
                    "https://a.example.cl/",
                    MockReply::status(429).with_header("Retry-After", "30"),
                )
                .with_reply("https://a.example.cl/", MockReply::page(200, "ok")),
        );
        let fetcher = fetcher(transport, clock.clone());

        fetcher.fetch(FetchRequest::new("https://a.example.cl/")).await.unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(30)]);
    }

    #[tokio::test]
    async fn test_returns_last_error_response_when_budget_spent() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new().with_reply("https://a.example.cl/", MockReply::status(500)),
        );
        let fetcher = fetcher(transport.clone(), clock.clone());

        let page = fetcher.fetch(FetchRequest::new("https://a.example.cl/")).await.unwrap();

        assert_eq!(page.status, 500);
        assert_eq!(transport.call_count(), 3);
        // no sleep after the final attempt
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_count_toward_budget() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new()
                .with_reply("https://a.example.cl/", MockReply::Timeout)
                .with_reply("https://a.example.cl/", MockReply::Timeout),
        );
        let fetcher = fetcher(transport.clone(), clock);

        let result = fetcher
            .fetch(FetchRequest::new("https://a.example.cl/").with_max_retries(2))
            .await;

        assert!(matches!(result, Err(FetchError::Timeout { .. })));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_recovers_after_refused_connection() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(
            MockTransport::new()
                .with_reply("https://a.example.cl/", MockReply::ConnectionRefused)
                .with_reply("https://a.example.cl/", MockReply::page(200, "back")),
        );
        let fetcher = PoliteFetcher::new(
            transport.clone(),
            config().with_backoff(Duration::from_secs(4), 1.8),
        )
        .with_clock(clock.clone());

        let page = fetcher.fetch(FetchRequest::new("https://a.example.cl/")).await.unwrap();

        assert_eq!(page.body, "back");
        assert_eq!(transport.call_count(), 2);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(4)]);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(MockTransport::new().with_reply("https://a.example.cl/", MockReply::status(404)));
        let fetcher = fetcher(transport.clone(), clock.clone());

        let page = fetcher.fetch(FetchRequest::new("https://a.example.cl/")).await.unwrap();

        assert_eq!(page.status, 404);
        assert_eq!(transport.call_count(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = fetcher(Arc::new(MockTransport::new()), Arc::new(MockClock::new()));
        let result = fetcher.fetch(FetchRequest::new("/relative")).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_jitter_bounds() {
        let range = (Duration::from_millis(300), Duration::from_millis(1200));
        for _ in 0..100 {
            let value = jitter(range);
            assert!(value >= range.0 && value <= range.1);
        }
        assert_eq!(jitter(NO_JITTER), Duration::ZERO);
    }
}
