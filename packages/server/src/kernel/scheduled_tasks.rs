//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The only periodic task keeps the job cache warm so requests rarely pay
//! for a scrape. It goes through [`JobCache::refresh`] like any request, so a
//! scheduled run and a request-triggered run never overlap.

use std::sync::Arc;

use anyhow::{Context, Result};
use job_scraper::{AggregateSource, JobCache, RefreshOutcome};
use tokio_cron_scheduler::{Job, JobScheduler};

/// Start the periodic cache refresh on the given cron schedule
pub async fn start_scheduler<S>(cache: Arc<JobCache<S>>, cron: &str) -> Result<JobScheduler>
where
    S: AggregateSource + 'static,
{
    let scheduler = JobScheduler::new().await?;

    let refresh_job = Job::new_async(cron, move |_uuid, _lock| {
        let cache = cache.clone();
        Box::pin(async move {
            run_scheduled_refresh(&cache).await;
        })
    })
    .with_context(|| format!("invalid refresh schedule {:?}", cron))?;

    scheduler.add(refresh_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %cron, "Scheduled cache refresh started");
    Ok(scheduler)
}

/// Refresh once in the background without blocking startup
pub fn spawn_warm_up<S>(cache: Arc<JobCache<S>>) -> tokio::task::JoinHandle<()>
where
    S: AggregateSource + 'static,
{
    tokio::spawn(async move {
        tracing::info!("Warming job cache");
        log_outcome("warm-up", cache.refresh(false).await);
    })
}

async fn run_scheduled_refresh<S: AggregateSource>(cache: &JobCache<S>) {
    tracing::info!("Running scheduled cache refresh");
    // Respects the TTL: a request may have refreshed moments ago
    log_outcome("scheduled", cache.refresh(false).await);
}

fn log_outcome(trigger: &str, outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Skipped => {
            tracing::debug!(trigger, "Cache still valid, refresh skipped")
        }
        RefreshOutcome::Refreshed(items) => {
            tracing::info!(trigger, items, "Cache refreshed")
        }
        RefreshOutcome::Failed(error) => {
            tracing::error!(trigger, error = %error, "Cache refresh failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_scraper::testing::{sample_job, MockAggregateSource};
    use job_scraper::CacheConfig;

    #[tokio::test]
    async fn test_warm_up_fills_cache() {
        let source = MockAggregateSource::new().with_jobs(vec![sample_job("Planner", 1)]);
        let cache = Arc::new(JobCache::new(source, CacheConfig::default()));

        spawn_warm_up(cache.clone()).await.unwrap();

        assert!(cache.is_valid().await);
        assert_eq!(cache.snapshot().await.items, 1);
        assert_eq!(cache.source().call_count(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_refresh_respects_ttl() {
        let source = MockAggregateSource::new().with_jobs(vec![sample_job("Planner", 1)]);
        let cache = JobCache::new(source, CacheConfig::default());

        run_scheduled_refresh(&cache).await;
        run_scheduled_refresh(&cache).await;

        assert_eq!(cache.source().call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_cron_is_rejected() {
        let cache = Arc::new(JobCache::new(
            MockAggregateSource::new(),
            CacheConfig::default(),
        ));
        assert!(start_scheduler(cache, "not a schedule").await.is_err());
    }
}
