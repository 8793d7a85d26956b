//! TTL cache in front of the aggregation pipeline.
//!
//! Reads inside the TTL never touch the network. Refreshes run behind a
//! single async mutex and waiters re-check validity once they hold it, so a
//! burst of concurrent misses triggers exactly one aggregation. The entry
//! itself sits behind an `RwLock` that is never held across a scrape, so
//! health checks and hits are served while a refresh is running.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::traits::aggregate::AggregateSource;
use crate::traits::clock::{Clock, SystemClock};
use crate::types::config::CacheConfig;
use crate::types::job::JobRecord;

/// How a read was served (the `X-Cache` header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Valid cached data, no refresh attempted
    Hit,
    /// Data produced by another caller's refresh, or stale data after a failure
    Miss,
    /// This call ran a successful aggregation
    Refreshed,
    /// Nothing to serve
    Empty,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Refreshed => "REFRESHED",
            CacheStatus::Empty => "EMPTY",
        }
    }
}

/// What [`JobCache::refresh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Data was already valid and the refresh was not forced
    Skipped,
    /// Aggregation succeeded; holds the new item count
    Refreshed(usize),
    /// Aggregation failed; holds the recorded error
    Failed(String),
}

/// Result of [`JobCache::get_jobs`].
#[derive(Debug, Clone)]
pub struct CacheRead {
    pub jobs: Vec<JobRecord>,
    pub status: CacheStatus,
}

/// Point-in-time view for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub items: usize,
    pub cache_age_seconds: Option<u64>,
    pub last_error: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheEntry {
    data: Vec<JobRecord>,
    refreshed_at: Option<Instant>,
    refreshed_at_utc: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

pub struct JobCache<S: AggregateSource> {
    source: S,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<CacheEntry>,
    refresh_lock: Mutex<()>,
}

impl<S: AggregateSource> JobCache<S> {
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self {
            source,
            ttl: config.ttl,
            clock: Arc::new(SystemClock),
            entry: RwLock::new(CacheEntry::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Use a different clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Non-empty data younger than the TTL.
    pub async fn is_valid(&self) -> bool {
        let entry = self.entry.read().await;
        self.entry_is_valid(&entry)
    }

    fn entry_is_valid(&self, entry: &CacheEntry) -> bool {
        if entry.data.is_empty() {
            return false;
        }
        entry
            .refreshed_at
            .map(|at| self.clock.now().saturating_duration_since(at) < self.ttl)
            .unwrap_or(false)
    }

    /// Re-run the aggregation unless data is valid and `force` is false.
    ///
    /// Failures keep the previous data, record the error and still bump the
    /// refresh time.
    pub async fn refresh(&self, force: bool) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;

        if !force && self.is_valid().await {
            return RefreshOutcome::Skipped;
        }

        info!(force, "Refreshing job cache");
        let result = self.source.aggregate().await;

        let mut entry = self.entry.write().await;
        entry.refreshed_at = Some(self.clock.now());
        entry.refreshed_at_utc = Some(Utc::now());

        match result {
            Ok(jobs) => {
                let count = jobs.len();
                entry.data = jobs;
                entry.last_error = None;
                info!(items = count, "Job cache refreshed");
                RefreshOutcome::Refreshed(count)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, kept = entry.data.len(), "Job cache refresh failed");
                entry.last_error = Some(message.clone());
                RefreshOutcome::Failed(message)
            }
        }
    }

    /// Serve jobs, refreshing first when the cache is invalid or `force` is set.
    pub async fn get_jobs(&self, force: bool) -> CacheRead {
        if !force {
            let entry = self.entry.read().await;
            if self.entry_is_valid(&entry) {
                return CacheRead {
                    jobs: entry.data.clone(),
                    status: CacheStatus::Hit,
                };
            }
        }

        let outcome = self.refresh(force).await;

        let entry = self.entry.read().await;
        let status = if entry.data.is_empty() {
            CacheStatus::Empty
        } else if matches!(outcome, RefreshOutcome::Refreshed(_)) {
            CacheStatus::Refreshed
        } else {
            CacheStatus::Miss
        };

        CacheRead {
            jobs: entry.data.clone(),
            status,
        }
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        let entry = self.entry.read().await;
        CacheSnapshot {
            items: entry.data.len(),
            cache_age_seconds: entry
                .refreshed_at
                .map(|at| self.clock.now().saturating_duration_since(at).as_secs()),
            last_error: entry.last_error.clone(),
            last_refreshed_at: entry.refreshed_at_utc,
        }
    }
}
