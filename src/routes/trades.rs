//! # routes::trades
//!
//! Journal endpoints for the dashboard.
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/api/trades`         | Current trades + loading / error state   |
//! | POST   | `/api/trades`         | Log a new trade                          |
//! | PATCH  | `/api/trades/:id`     | Partial update (e.g. close with profit)  |
//! | DELETE | `/api/trades/:id`     | Remove a trade                           |
//! | POST   | `/api/trades/reload`  | Load an account (or reload current one)  |
//! | GET    | `/api/trades/stats`   | Win rate, P&L, drawdown                  |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    market::PORTFOLIO_KEY,
    models::{NewTrade, TradePatch},
    perf::timed,
    state::SharedState,
};

/// GET /api/trades
pub async fn list_trades(State(state): State<SharedState>) -> impl IntoResponse {
    let journal = &state.journal;
    let trades = journal.trades().await;

    Json(json!({
        "ok":         true,
        "account_id": journal.account_id().await,
        "loading":    journal.is_loading().await,
        "error":      journal.last_error().await,
        "count":      trades.len(),
        "trades":     trades,
    }))
}

/// POST /api/trades
pub async fn add_trade(
    State(state): State<SharedState>,
    Json(input): Json<NewTrade>,
) -> Result<impl IntoResponse, AppError> {
    validate(&input)?;
    let trade = timed("add_trade", state.journal.add(input)).await?;
    state.cache.invalidate(PORTFOLIO_KEY);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "trade": trade })),
    ))
}

/// PATCH /api/trades/:id — unknown ids are answered with `updated: false`.
pub async fn update_trade(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TradePatch>,
) -> Result<impl IntoResponse, AppError> {
    let trade = timed("update_trade", state.journal.update(id, patch)).await?;
    if trade.is_some() {
        state.cache.invalidate(PORTFOLIO_KEY);
    }

    Ok(Json(json!({
        "ok":      true,
        "updated": trade.is_some(),
        "trade":   trade,
    })))
}

/// DELETE /api/trades/:id
pub async fn delete_trade(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = timed("delete_trade", state.journal.delete(id)).await?;
    if deleted {
        state.cache.invalidate(PORTFOLIO_KEY);
    }
    Ok(Json(json!({ "ok": true, "deleted": deleted })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReloadBody {
    pub account_id: Option<String>,
}

/// POST /api/trades/reload — body `{ "account_id": "..." }` is optional.
/// Without one the current account is reloaded; with no account loaded the
/// response carries `ok: false` and `"no account loaded"`.
pub async fn reload_trades(
    State(state): State<SharedState>,
    body: Option<Json<ReloadBody>>,
) -> impl IntoResponse {
    let requested = body.and_then(|Json(b)| b.account_id);
    match requested {
        Some(account_id) => state.journal.load(&account_id).await,
        None => state.journal.refresh().await,
    }
    state.cache.invalidate(PORTFOLIO_KEY);

    let error = state.journal.last_error().await;
    Json(json!({
        "ok":         error.is_none(),
        "account_id": state.journal.account_id().await,
        "count":      state.journal.trades().await.len(),
        "error":      error,
    }))
}

/// GET /api/trades/stats
pub async fn get_stats(State(state): State<SharedState>) -> impl IntoResponse {
    let stats = state.journal.stats().await;
    Json(json!({ "ok": true, "stats": stats }))
}

fn validate(input: &NewTrade) -> Result<(), AppError> {
    if input.symbol.trim().is_empty() {
        return Err(AppError::BadRequest("symbol must not be empty".into()));
    }
    if !(input.entry_price.is_finite() && input.entry_price > 0.0) {
        return Err(AppError::BadRequest("entry_price must be positive".into()));
    }
    if !(input.quantity.is_finite() && input.quantity > 0.0) {
        return Err(AppError::BadRequest("quantity must be positive".into()));
    }
    Ok(())
}
