//! # routes::health
//!
//! `GET /health` — liveness probe for load balancers.

use axum::{response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status":    "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service":   env!("CARGO_PKG_NAME"),
    }))
}
