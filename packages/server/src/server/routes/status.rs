use axum::Json;
use serde_json::{json, Value};

/// Liveness banner
pub async fn status_handler() -> Json<Value> {
    Json(json!({ "status": "Job Aggregator API activa" }))
}
