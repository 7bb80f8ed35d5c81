//! HTTP surface. Handlers stay thin: they validate, call the journal or the
//! cache, and shape JSON.

pub mod health;
pub mod market;
pub mod monitor;
pub mod trades;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ── Health ────────────────────────────────────────────────────────────
        .route("/health",               get(health::health_check))
        // ── Journal ───────────────────────────────────────────────────────────
        .route("/api/trades",           get(trades::list_trades).post(trades::add_trade))
        .route("/api/trades/stats",     get(trades::get_stats))
        .route("/api/trades/reload",    post(trades::reload_trades))
        .route("/api/trades/:id",       patch(trades::update_trade).delete(trades::delete_trade))
        // ── Cached upstream ───────────────────────────────────────────────────
        .route("/api/market/:symbol",   get(market::get_quote))
        .route("/api/ai/status",        get(market::get_ai_status))
        .route("/api/portfolio",        get(market::get_portfolio))
        .route("/api/cache/stats",      get(market::cache_stats))
        .route("/api/cache/clear",      post(market::clear_cache))
        // ── Notifications ─────────────────────────────────────────────────────
        .route("/ws/notifications",     get(monitor::ws_notifications))
        .route("/api/notify/ping",      post(monitor::ping))
        .with_state(state)
}
