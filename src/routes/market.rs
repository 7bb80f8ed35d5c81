//! # routes::market
//!
//! Cached pass-through to upstream services, plus cache administration.
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/api/market/:symbol`  | Quote for a symbol (default TTL)     |
//! | GET    | `/api/ai/status`       | AI coach availability (quick TTL)    |
//! | GET    | `/api/portfolio`       | Balance + open positions (quick TTL) |
//! | GET    | `/api/cache/stats`     | Hit/miss/dedup counters              |
//! | POST   | `/api/cache/clear`     | Drop every cached response           |

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{error::AppError, market, perf::timed, state::SharedState};

/// GET /api/market/:symbol
pub async fn get_quote(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ttl = state.config.cache_default_ttl;
    let quote = timed("market_quote", state.market.quote(&state.cache, &symbol, ttl)).await?;
    Ok(Json(json!({ "ok": true, "symbol": symbol.to_uppercase(), "data": quote })))
}

/// GET /api/ai/status
pub async fn get_ai_status(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let ttl = state.config.cache_quick_ttl;
    let status = timed("ai_status", state.market.ai_status(&state.cache, ttl)).await?;
    Ok(Json(json!({ "ok": true, "data": status })))
}

/// GET /api/portfolio
pub async fn get_portfolio(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let ttl = state.config.cache_quick_ttl;
    let snapshot = timed("portfolio", market::portfolio(&state.cache, &state.journal, ttl)).await?;
    Ok(Json(json!({ "ok": true, "data": snapshot })))
}

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<SharedState>) -> impl IntoResponse {
    let metrics = state.cache.metrics();
    Json(json!({
        "ok":       true,
        "hit_rate": metrics.hit_rate(),
        "metrics":  metrics,
    }))
}

/// POST /api/cache/clear — used on logout / manual refresh
pub async fn clear_cache(State(state): State<SharedState>) -> impl IntoResponse {
    let dropped = state.cache.len();
    state.cache.clear();
    info!(dropped, "🧹 cache cleared via API");
    Json(json!({ "ok": true, "dropped": dropped }))
}
