//! Configuration types for fetching, scraping and caching.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default search categories, in scrape order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Planner",
    "Product Manager",
    "CPFR",
    "Category Manager",
    "Lead Manager",
    "Mejora Continua",
    "Proyectos",
    "Customer",
    "Business Intelligence",
];

/// Configuration for the polite fetch layer.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Minimum spacing for domains without an explicit entry.
    ///
    /// Default: 10s.
    pub default_delay: Duration,

    /// Minimum spacing per lowercased host.
    pub domain_delays: HashMap<String, Duration>,

    /// TCP/TLS connect timeout. Default: 8s.
    pub connect_timeout: Duration,

    /// Whole-response read timeout. Default: 20s.
    pub read_timeout: Duration,

    /// Total attempts per request (first try included). Default: 3.
    pub max_retries: u32,

    /// First backoff sleep when no `Retry-After` is given. Default: 4s.
    pub backoff_initial: Duration,

    /// Backoff growth per retry. Default: 1.8.
    pub backoff_factor: f64,

    /// Random extra added to politeness waits.
    pub politeness_jitter: (Duration, Duration),

    /// Random extra added to backoff sleeps.
    pub backoff_jitter: (Duration, Duration),

    /// Session user agent; identifies the bot and how to reach its operator.
    pub user_agent: String,

    pub accept_language: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        let domain_delays = [
            ("www.google.com", 12),
            ("www.laborum.cl", 10),
            ("www.chiletrabajos.cl", 10),
            ("www.getonbrd.com", 12),
            ("cl.indeed.com", 15),
            ("www.empleospublicos.cl", 12),
        ]
        .into_iter()
        .map(|(domain, secs)| (domain.to_string(), Duration::from_secs(secs)))
        .collect();

        Self {
            default_delay: Duration::from_secs(10),
            domain_delays,
            connect_timeout: Duration::from_secs(8),
            read_timeout: Duration::from_secs(20),
            max_retries: 3,
            backoff_initial: Duration::from_secs(4),
            backoff_factor: 1.8,
            politeness_jitter: (Duration::from_millis(300), Duration::from_millis(1200)),
            backoff_jitter: (Duration::from_millis(500), Duration::from_millis(2000)),
            user_agent: "JobAggregatorBot/1.0 (contact: jobs@example.cl)".to_string(),
            accept_language: "es-CL,es;q=0.9,en;q=0.8".to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay used for unlisted domains.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Set the delay for one domain.
    pub fn with_domain_delay(mut self, domain: impl Into<String>, delay: Duration) -> Self {
        self.domain_delays.insert(domain.into().to_lowercase(), delay);
        self
    }

    /// Drop the per-domain table so every domain uses the default delay.
    pub fn without_domain_delays(mut self) -> Self {
        self.domain_delays.clear();
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, factor: f64) -> Self {
        self.backoff_initial = initial;
        self.backoff_factor = factor;
        self
    }

    /// Set both jitter ranges; zero ranges make waits deterministic.
    pub fn with_jitter(
        mut self,
        politeness: (Duration, Duration),
        backoff: (Duration, Duration),
    ) -> Self {
        self.politeness_jitter = politeness;
        self.backoff_jitter = backoff;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Minimum spacing for a (lowercased) domain.
    pub fn delay_for(&self, domain: &str) -> Duration {
        self.domain_delays
            .get(domain)
            .copied()
            .unwrap_or(self.default_delay)
    }
}

/// Configuration for one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Search categories, scraped in this order.
    pub categories: Vec<String>,

    /// Recency window in days. Default: 5.
    pub max_days: u32,

    /// Listing pages per portal.
    pub laborum_pages: u32,
    pub chiletrabajos_pages: u32,
    pub getonbrd_pages: u32,
    pub indeed_pages: u32,

    /// Cap on public-sector records per category. Default: 10.
    pub public_sector_max_items: usize,

    /// Search-engine results requested per category. Default: 8.
    pub search_results_per_category: u32,

    /// Visit search-result detail pages for better title/company/date.
    ///
    /// Default: true.
    pub enrich_details: bool,

    /// Attempt budget for detail-page fetches. Default: 2.
    pub detail_max_retries: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            max_days: 5,
            laborum_pages: 2,
            chiletrabajos_pages: 1,
            getonbrd_pages: 1,
            indeed_pages: 1,
            public_sector_max_items: 10,
            search_results_per_category: 8,
            enrich_details: true,
            detail_max_retries: 2,
        }
    }
}

impl ScrapeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.categories = categories.into_iter().map(|c| c.into()).collect();
        self
    }

    pub fn with_max_days(mut self, days: u32) -> Self {
        self.max_days = days;
        self
    }

    pub fn with_search_results(mut self, results: u32) -> Self {
        self.search_results_per_category = results;
        self
    }

    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_details = enabled;
        self
    }
}

/// Configuration for the aggregate cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which cached data is refreshed. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_delays() {
        let config = FetcherConfig::default();
        assert_eq!(config.delay_for("cl.indeed.com"), Duration::from_secs(15));
        assert_eq!(config.delay_for("www.google.com"), Duration::from_secs(12));
        assert_eq!(config.delay_for("unknown.cl"), Duration::from_secs(10));
    }

    #[test]
    fn test_domain_delay_is_lowercased() {
        let config = FetcherConfig::new()
            .without_domain_delays()
            .with_domain_delay("WWW.Example.CL", Duration::from_secs(3));
        assert_eq!(config.delay_for("www.example.cl"), Duration::from_secs(3));
        assert_eq!(config.delay_for("cl.indeed.com"), Duration::from_secs(10));
    }

    #[test]
    fn test_scrape_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.categories.first().map(String::as_str), Some("Planner"));
        assert_eq!(config.categories.len(), 9);
        assert_eq!(config.laborum_pages, 2);
        assert_eq!(config.public_sector_max_items, 10);
    }
}
