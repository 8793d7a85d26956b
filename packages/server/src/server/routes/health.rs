use axum::{extract::Extension, Json};
use chrono::{DateTime, Utc};
use job_scraper::AggregateSource;
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    items: usize,
    cache_age_seconds: Option<u64>,
    last_error: Option<String>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// Health check endpoint
///
/// Reports cache contents without waiting for a refresh in progress. Scrape
/// failures show up in `last_error`; the endpoint itself always answers 200.
pub async fn health_handler<S: AggregateSource + 'static>(
    Extension(state): Extension<AppState<S>>,
) -> Json<HealthResponse> {
    let snapshot = state.cache.snapshot().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        items: snapshot.items,
        cache_age_seconds: snapshot.cache_age_seconds,
        last_error: snapshot.last_error,
        last_refreshed_at: snapshot.last_refreshed_at,
    })
}
