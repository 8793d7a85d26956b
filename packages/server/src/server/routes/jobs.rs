use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    Json,
};
use job_scraper::AggregateSource;
use serde::Deserialize;

use crate::server::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    /// `1`/`true` forces a refresh before answering
    refresh: Option<String>,
}

impl JobsQuery {
    pub fn force_refresh(&self) -> bool {
        self.refresh
            .as_deref()
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false)
    }
}

/// Cached job list
///
/// Always 200: scraping problems surface as stale or empty data, with the
/// cache state in `X-Cache` and details on `/health`.
pub async fn jobs_handler<S: AggregateSource + 'static>(
    Extension(state): Extension<AppState<S>>,
    Query(query): Query<JobsQuery>,
) -> impl IntoResponse {
    let force = query.force_refresh();
    let read = state.cache.get_jobs(force).await;

    tracing::debug!(
        force,
        status = read.status.as_str(),
        items = read.jobs.len(),
        "Serving jobs"
    );

    let max_age = format!("public, max-age={}", state.cache.ttl().as_secs());
    (
        [
            ("x-cache", read.status.as_str().to_string()),
            ("cache-control", max_age),
        ],
        Json(read.jobs),
    )
}
