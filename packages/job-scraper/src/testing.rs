//! Testing utilities including mock implementations.
//!
//! These let applications and the crate's own tests run the full pipeline
//! without network access or real waiting.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::error::{AggregateError, AggregateResult, FetchError, FetchResult};
use crate::traits::{aggregate::AggregateSource, clock::Clock, transport::Transport};
use crate::types::job::{JobRecord, Source};
use crate::types::page::{FetchRequest, FetchedPage};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Page {
        status: u16,
        body: String,
        headers: Vec<(String, String)>,
        final_url: Option<String>,
    },
    Timeout,
    ConnectionRefused,
}

impl MockReply {
    pub fn page(status: u16, body: impl Into<String>) -> Self {
        MockReply::Page {
            status,
            body: body.into(),
            headers: Vec::new(),
            final_url: None,
        }
    }

    /// A response with an empty body.
    pub fn status(status: u16) -> Self {
        Self::page(status, "")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let MockReply::Page { headers, .. } = &mut self {
            headers.push((name.into(), value.into()));
        }
        self
    }

    /// Pretend the request was redirected here.
    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        if let MockReply::Page { final_url, .. } = &mut self {
            *final_url = Some(url.into());
        }
        self
    }
}

struct Route {
    prefix: String,
    replies: VecDeque<MockReply>,
}

/// Mock transport with scripted replies per URL prefix.
///
/// The longest registered prefix matching the full request URL (query
/// included) answers. Each route replays its queue in order and keeps
/// repeating the last reply. Unmatched requests get an empty 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Arc<RwLock<Vec<Route>>>,
    calls: Arc<RwLock<Vec<String>>>,
    call_times: Arc<RwLock<Vec<Instant>>>,
    clock: Option<Arc<dyn Clock>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp each call with this clock's time (see [`call_times`](Self::call_times)).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Queue a reply for URLs starting with `prefix`.
    pub fn with_reply(self, prefix: impl Into<String>, reply: MockReply) -> Self {
        self.add_reply(prefix, reply);
        self
    }

    /// Queue a page for URLs starting with `prefix`.
    pub fn with_page(self, prefix: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.with_reply(prefix, MockReply::page(status, body))
    }

    pub fn add_reply(&self, prefix: impl Into<String>, reply: MockReply) {
        let prefix = prefix.into();
        let mut routes = self.routes.write().unwrap();
        match routes.iter_mut().find(|route| route.prefix == prefix) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                prefix,
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Full URLs requested, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Number of requests whose URL starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    /// Clock time of each call; empty unless built [`with_clock`](Self::with_clock).
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.read().unwrap().clone()
    }

    fn next_reply(&self, url: &str) -> Option<MockReply> {
        let mut routes = self.routes.write().unwrap();
        let route = routes
            .iter_mut()
            .filter(|route| url.starts_with(&route.prefix))
            .max_by_key(|route| route.prefix.len())?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

/// Request URL with its query parameters appended.
pub fn full_url(request: &FetchRequest) -> String {
    if request.query.is_empty() {
        return request.url.clone();
    }
    match url::Url::parse_with_params(&request.url, &request.query) {
        Ok(url) => url.to_string(),
        Err(_) => request.url.clone(),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &FetchRequest) -> FetchResult<FetchedPage> {
        let url = full_url(request);
        self.calls.write().unwrap().push(url.clone());
        if let Some(clock) = &self.clock {
            self.call_times.write().unwrap().push(clock.now());
        }

        match self.next_reply(&url) {
            Some(MockReply::Page {
                status,
                body,
                headers,
                final_url,
            }) => {
                let mut page = FetchedPage::new(url.clone(), status, body);
                if let Some(final_url) = final_url {
                    page = page.with_final_url(final_url);
                }
                for (name, value) in headers {
                    page = page.with_header(name, value);
                }
                Ok(page)
            }
            Some(MockReply::Timeout) => Err(FetchError::Timeout { url }),
            Some(MockReply::ConnectionRefused) => Err(FetchError::Transport {
                url,
                source: "connection refused".into(),
            }),
            None => Ok(FetchedPage::new(url, 404, "")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Virtual clock: `sleep` advances time instantly and is recorded.
pub struct MockClock {
    start: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        *self.offset.lock().unwrap() += duration;
    }

    /// Every sleep requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Virtual time since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// Scripted aggregate source for cache tests.
///
/// Replays queued outcomes in order, repeating the last one. With nothing
/// queued it returns an empty list.
#[derive(Default)]
pub struct MockAggregateSource {
    outcomes: Mutex<VecDeque<Result<Vec<JobRecord>, String>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockAggregateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(self, jobs: Vec<JobRecord>) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(jobs));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Make each aggregation take real time (concurrency tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AggregateSource for MockAggregateSource {
    async fn aggregate(&self) -> AggregateResult<Vec<JobRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.pop_front()
            } else {
                outcomes.front().cloned()
            }
        };

        match outcome {
            Some(Ok(jobs)) => Ok(jobs),
            Some(Err(message)) => Err(AggregateError::Failed(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// A small valid record with a unique link.
pub fn sample_job(category: &str, n: u32) -> JobRecord {
    JobRecord::new(
        category,
        Source::Chiletrabajos,
        &format!("{} {}", category, n),
        "ACME SpA",
        "Santiago",
        &format!("https://www.chiletrabajos.cl/trabajo/{}", n),
    )
    .with_posted("hace 1 día")
}

/// Wrap body markup in a minimal HTML document.
pub fn html_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>fixture</title></head><body>{}</body></html>",
        body
    )
}

/// A JSON-LD script tag holding `value`.
pub fn json_ld_script(value: &serde_json::Value) -> String {
    format!(r#"<script type="application/ld+json">{}</script>"#, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_longest_prefix_wins_and_last_reply_repeats() {
        let transport = MockTransport::new()
            .with_page("https://x.cl/", 200, "root")
            .with_page("https://x.cl/jobs", 503, "")
            .with_page("https://x.cl/jobs", 200, "jobs");

        let jobs = FetchRequest::new("https://x.cl/jobs");
        assert_eq!(transport.send(&jobs).await.unwrap().status, 503);
        assert_eq!(transport.send(&jobs).await.unwrap().body, "jobs");
        assert_eq!(transport.send(&jobs).await.unwrap().body, "jobs");
        assert_eq!(
            transport.send(&FetchRequest::new("https://x.cl/about")).await.unwrap().body,
            "root"
        );
        assert_eq!(
            transport.send(&FetchRequest::new("https://y.cl/")).await.unwrap().status,
            404
        );
        assert_eq!(transport.calls_to("https://x.cl/jobs"), 3);
    }

    #[tokio::test]
    async fn test_query_is_part_of_the_matched_url() {
        let transport = MockTransport::new()
            .with_page("https://x.cl/list", 200, "page 1")
            .with_page("https://x.cl/list?page=2", 200, "page 2");

        let second = FetchRequest::new("https://x.cl/list").with_query("page", "2");
        assert_eq!(transport.send(&second).await.unwrap().body, "page 2");
        assert_eq!(transport.calls(), vec!["https://x.cl/list?page=2".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_clock_sleep_advances() {
        let clock = MockClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_secs(3)).await;
        assert_eq!(clock.now().duration_since(before), Duration::from_secs(3));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3)]);
    }

    #[tokio::test]
    async fn test_mock_aggregate_source_script() {
        let source = MockAggregateSource::new()
            .with_failure("boom")
            .with_jobs(vec![sample_job("Planner", 1)]);

        assert!(source.aggregate().await.is_err());
        assert_eq!(source.aggregate().await.unwrap().len(), 1);
        assert_eq!(source.aggregate().await.unwrap().len(), 1);
        assert_eq!(source.call_count(), 3);
    }
}
