// Main entry point for the job aggregator API

use std::sync::Arc;

use anyhow::{Context, Result};
use job_scraper::{Aggregator, HttpTransport, JobCache, PoliteFetcher};
use server_core::{
    kernel::{spawn_warm_up, start_scheduler},
    server::build_app,
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_scraper=debug,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Job Aggregator API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        ttl_seconds = config.cache_ttl.as_secs(),
        max_days = config.max_days,
        "Configuration loaded"
    );

    // Scraping stack
    let fetcher_config = config.fetcher_config();
    let transport =
        HttpTransport::new(&fetcher_config).context("Failed to build HTTP client")?;
    let fetcher = Arc::new(PoliteFetcher::new(Arc::new(transport), fetcher_config));
    let aggregator = Aggregator::from_config(fetcher, &config.scrape_config());
    let cache = Arc::new(JobCache::new(aggregator, config.cache_config()));

    if config.warm_cache_on_startup {
        spawn_warm_up(cache.clone());
    }

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = match &config.refresh_cron {
        Some(cron) => Some(
            start_scheduler(cache.clone(), cron)
                .await
                .context("Failed to start scheduler")?,
        ),
        None => None,
    };

    // Build application
    let app = build_app(cache);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Jobs: http://localhost:{}/jobs", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
