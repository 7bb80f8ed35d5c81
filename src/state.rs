//! # state
//!
//! AppState — every shared service, built once at startup and injected into
//! each Axum handler. Nothing here is a process-wide global.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::Config,
    events::BroadcastSink,
    journal::TradeJournal,
    market::MarketClient,
    perf::{Debouncer, RequestCache},
    store::{JsonFileStore, MemoryStore, TradeStore},
};

/// Capacity of the notification broadcast channel.
const NOTIFY_CHANNEL_SIZE: usize = 256;

#[derive(Clone)]
pub struct AppState {
    // ── Trade Aggregation ─────────────────────────────────────────────────────
    pub journal: Arc<TradeJournal>,

    // ── Request Cache / Dedup ─────────────────────────────────────────────────
    /// Upstream JSON responses (market data, AI status).
    pub cache:     RequestCache<Value>,
    pub debouncer: Debouncer,
    pub market:    MarketClient,

    // ── Notifications ─────────────────────────────────────────────────────────
    /// Toast channel; every WebSocket client subscribes to it.
    pub notifier: BroadcastSink,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn TradeStore> = match &config.trade_store_path {
            Some(path) => Arc::new(JsonFileStore::new(path.clone())),
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn TradeStore>) -> Self {
        let notifier = BroadcastSink::new(NOTIFY_CHANNEL_SIZE);
        let journal = TradeJournal::new(store, Arc::new(notifier.clone()));
        let market = MarketClient::new(
            reqwest::Client::new(),
            config.market_url.clone(),
            config.ai_status_url.clone(),
        );

        Self {
            journal: Arc::new(journal),
            cache: RequestCache::new(),
            debouncer: Debouncer::new(),
            market,
            notifier,
            config: Arc::new(config),
        }
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: Config) -> SharedState {
    Arc::new(AppState::new(config))
}
