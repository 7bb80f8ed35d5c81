//! # events
//!
//! Defines [`JournalEvent`] — every notification the journal emits after a
//! durable operation settles — and the fire-and-forget sink it is sent to.
//!
//! The server wires [`BroadcastSink`] so events reach every dashboard
//! WebSocket as pre-serialized JSON, which avoids Clone bounds on receivers.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEvent {
    TradesLoaded {
        account_id: String,
        count:      usize,
    },

    TradeAdded {
        trade: Box<Trade>,
    },

    TradeUpdated {
        trade: Box<Trade>,
    },

    TradeDeleted {
        id: Uuid,
    },

    /// A journal operation failed; `operation` is `load` | `add` | `update` | `delete`.
    OperationFailed {
        operation: &'static str,
        message:   String,
    },

    /// Emitted by the debounced ping endpoint.
    Ping {
        note: Option<String>,
    },
}

impl JournalEvent {
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JournalEvent::OperationFailed { .. })
    }
}

// ─── Sinks ────────────────────────────────────────────────────────────────────

/// Toast / alert channel. Must never block and never fail the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &JournalEvent);
}

/// Fans events out to every subscribed WebSocket.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<String>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn notify(&self, event: &JournalEvent) {
        // Err only means nobody is listening right now
        let _ = self.tx.send(event.to_json());
    }
}
