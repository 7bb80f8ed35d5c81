//! # error
//!
//! Error types for every layer.
//!
//! - [`StoreError`]   — the persistence collaborator failed
//! - [`JournalError`] — a journal operation could not be applied
//! - [`FetchError`]   — a cached producer failed; cloneable so a single
//!   failure can be handed to every caller waiting on the same key
//! - [`AppError`]     — HTTP-facing; Axum's `IntoResponse` impl turns it into
//!   a structured JSON body so the dashboard always gets a machine-readable
//!   response even on failure

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TradeStatus;

// ─── Persistence ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (e.g. a remote store rejected the write).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// ─── Journal ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum JournalError {
    /// `add` or `refresh` was called before any account was loaded.
    #[error("no account loaded")]
    NoAccount,

    #[error("trade {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id:   Uuid,
        from: TradeStatus,
        to:   TradeStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ─── Cache producers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
#[error("{0:#}")]
pub struct FetchError(Arc<anyhow::Error>);

impl FetchError {
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

// ─── HTTP ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    /// The request payload was syntactically correct but semantically invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The journal refused or failed the operation.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// An upstream fetch (market data, AI status) failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] FetchError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Journal(JournalError::NoAccount) => StatusCode::CONFLICT,
            AppError::Journal(JournalError::InvalidTransition { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Journal(JournalError::Store(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
