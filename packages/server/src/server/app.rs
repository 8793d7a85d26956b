//! Application setup and server configuration.

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use job_scraper::{AggregateSource, JobCache};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::routes::{health_handler, jobs_handler, status_handler};

/// Shared application state
pub struct AppState<S: AggregateSource> {
    pub cache: Arc<JobCache<S>>,
}

impl<S: AggregateSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

/// Build the Axum application router
///
/// Generic over the aggregate source so route tests can serve a scripted
/// cache instead of scraping.
pub fn build_app<S>(cache: Arc<JobCache<S>>) -> Router
where
    S: AggregateSource + 'static,
{
    let state = AppState { cache };

    // The API is public and read-only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status_handler))
        .route("/jobs", get(jobs_handler::<S>))
        .route("/health", get(health_handler::<S>))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
