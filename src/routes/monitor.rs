//! # routes::monitor
//!
//! **Notification stream** for the dashboard's toasts.
//!
//! | Method    | Path                  | Description                               |
//! |-----------|-----------------------|-------------------------------------------|
//! | GET (WS)  | `/ws/notifications`   | Every `JournalEvent` as a JSON text frame |
//! | POST      | `/api/notify/ping`    | Debounced test notification               |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    events::{JournalEvent, NotificationSink},
    state::SharedState,
};

// ─── WebSocket Handler ────────────────────────────────────────────────────────

pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let mut rx = state.notifier.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    // ── Snapshot on connect ───────────────────────────────────────────────────
    let snapshot = json!({
        "event":      "SNAPSHOT",
        "account_id": state.journal.account_id().await,
        "stats":      state.journal.stats().await,
        "error":      state.journal.last_error().await,
    })
    .to_string();

    if sender.send(Message::Text(snapshot)).await.is_err() {
        return;
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}

// ─── Debounced ping ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PingBody {
    pub note: Option<String>,
}

/// POST /api/notify/ping — rapid repeats collapse into one PING event
/// carrying the last note.
pub async fn ping(
    State(state): State<SharedState>,
    body: Option<Json<PingBody>>,
) -> impl IntoResponse {
    let note = body.and_then(|Json(b)| b.note);
    let delay = state.config.debounce_delay;
    let notifier = state.notifier.clone();

    state.debouncer.debounce(
        "notify_ping",
        move || async move {
            notifier.notify(&JournalEvent::Ping { note });
            Ok(())
        },
        delay,
    );

    Json(json!({ "ok": true, "scheduled_in_ms": delay.as_millis() as u64 }))
}
