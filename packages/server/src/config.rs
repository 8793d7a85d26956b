use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use job_scraper::{CacheConfig, FetcherConfig, ScrapeConfig};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub max_days: u32,
    pub search_results_per_category: u32,
    pub enrich_details: bool,
    pub warm_cache_on_startup: bool,
    /// Six-field cron expression for background refresh, e.g. `0 0 * * * *`
    pub refresh_cron: Option<String>,
    /// Contact put in the scraper's user agent
    pub scraper_contact: Option<String>,
    /// Overrides the default category list when set
    pub categories: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| -> Result<u64> {
            match var(key) {
                Some(value) => value
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a valid number", key)),
                None => Ok(default),
            }
        };

        let flag = |key: &str, default: bool| -> Result<bool> {
            match var(key).map(|v| v.trim().to_lowercase()) {
                None => Ok(default),
                Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
                Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
                Some(v) => bail!("{} must be a boolean, got {:?}", key, v),
            }
        };

        let port = number("PORT", 8000)?;
        let port = u16::try_from(port).context("PORT must be a valid port number")?;
        let max_days = u32::try_from(number("SCRAPE_MAX_DAYS", 5)?)
            .context("SCRAPE_MAX_DAYS is out of range")?;
        let search_results = u32::try_from(number("GOOGLE_RESULTS_PER_CATEGORY", 8)?)
            .context("GOOGLE_RESULTS_PER_CATEGORY is out of range")?;

        let categories = var("JOB_CATEGORIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty());

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cache_ttl: Duration::from_secs(number("CACHE_TTL_SECONDS", 3600)?),
            max_days,
            search_results_per_category: search_results,
            enrich_details: flag("ENRICH_DETAILS", true)?,
            warm_cache_on_startup: flag("WARM_CACHE_ON_STARTUP", false)?,
            refresh_cron: var("REFRESH_CRON").filter(|c| !c.trim().is_empty()),
            scraper_contact: var("SCRAPER_CONTACT").filter(|c| !c.trim().is_empty()),
            categories,
        })
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        let config = FetcherConfig::default();
        match &self.scraper_contact {
            Some(contact) => {
                config.with_user_agent(format!("JobAggregatorBot/1.0 (contact: {})", contact))
            }
            None => config,
        }
    }

    pub fn scrape_config(&self) -> ScrapeConfig {
        let mut config = ScrapeConfig::default()
            .with_max_days(self.max_days)
            .with_search_results(self.search_results_per_category)
            .with_enrichment(self.enrich_details);
        if let Some(categories) = &self.categories {
            config = config.with_categories(categories.clone());
        }
        config
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::with_ttl(self.cache_ttl)
    }
}
