//! # journal — Trade Aggregation Layer
//!
//! [`TradeJournal`] is the in-memory source of truth for one account's
//! trades, kept in step with a durable [`TradeStore`].
//!
//! ## Write paths
//! | Operation | Strategy                                                   |
//! |-----------|------------------------------------------------------------|
//! | `add`     | durable write first, then prepend (nothing shown on failure) |
//! | `update`  | optimistic replace → upsert → commit or restore previous   |
//! | `delete`  | optimistic remove → delete → commit or reinsert in place   |
//!
//! Every mutation reports its outcome to the [`NotificationSink`] once the
//! durable call settles. Failures are also kept in `last_error` so the
//! dashboard can render a message; `load` never returns an error at all.
//!
//! Single-writer: two call sites racing on the same trade id are not guarded.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    error::JournalError,
    events::{JournalEvent, NotificationSink},
    models::{NewTrade, Trade, TradePatch},
    perf::optimistic,
    stats::TradeStats,
    store::TradeStore,
};

// ─── Internal State ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct JournalInner {
    account_id: Option<String>,
    /// Most recent first.
    trades:     Vec<Trade>,
    loading:    bool,
    last_error: Option<String>,
}

// ─── TradeJournal ─────────────────────────────────────────────────────────────

pub struct TradeJournal {
    store: Arc<dyn TradeStore>,
    sink:  Arc<dyn NotificationSink>,
    inner: RwLock<JournalInner>,
}

impl TradeJournal {
    pub fn new(store: Arc<dyn TradeStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            sink,
            inner: RwLock::new(JournalInner::default()),
        }
    }

    // ─── Load ─────────────────────────────────────────────────────────────────

    /// Replaces the in-memory set with `account_id`'s trades.
    ///
    /// On failure the previous account and trades stay in place and the
    /// error is exposed through [`last_error`](Self::last_error).
    pub async fn load(&self, account_id: &str) {
        {
            let mut inner = self.inner.write().await;
            inner.loading = true;
            inner.last_error = None;
        }

        info!(account_id, "Fetching trades");
        let result = self.store.get_trades(account_id).await;

        let mut inner = self.inner.write().await;
        inner.loading = false;
        match result {
            Ok(mut trades) => {
                trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                info!(account_id, count = trades.len(), "Fetched trades");
                let count = trades.len();
                inner.trades = trades;
                inner.account_id = Some(account_id.to_string());
                drop(inner);
                self.sink.notify(&JournalEvent::TradesLoaded {
                    account_id: account_id.to_string(),
                    count,
                });
            }
            Err(e) => {
                drop(inner);
                self.report("load", JournalError::from(e)).await;
            }
        }
    }

    /// Reloads the current account. With none loaded this reports
    /// [`JournalError::NoAccount`], replacing whatever error was showing.
    pub async fn refresh(&self) {
        let account = self.inner.read().await.account_id.clone();
        match account {
            Some(account_id) => self.load(&account_id).await,
            None => {
                self.report("refresh", JournalError::NoAccount).await;
            }
        }
    }

    // ─── Add ──────────────────────────────────────────────────────────────────

    pub async fn add(&self, input: NewTrade) -> Result<Trade, JournalError> {
        let account = self.inner.read().await.account_id.clone();
        let Some(account_id) = account else {
            return Err(self.report("add", JournalError::NoAccount).await);
        };

        let trade = Trade::from_input(&account_id, input);
        debug!(trade_id = %trade.id, symbol = %trade.symbol, "Adding trade");

        if let Err(e) = self.store.bulk_upsert(std::slice::from_ref(&trade)).await {
            return Err(self.report("add", e.into()).await);
        }

        self.inner.write().await.trades.insert(0, trade.clone());
        info!(trade_id = %trade.id, "✅ Trade added");
        self.sink.notify(&JournalEvent::TradeAdded { trade: Box::new(trade.clone()) });
        Ok(trade)
    }

    // ─── Update ───────────────────────────────────────────────────────────────

    /// Merges `patch` onto the trade and upserts it.
    ///
    /// Returns `Ok(None)` without touching the store when `id` is unknown.
    pub async fn update(&self, id: Uuid, patch: TradePatch) -> Result<Option<Trade>, JournalError> {
        let Some(current) = self.get(id).await else {
            debug!(trade_id = %id, "update skipped: unknown trade");
            return Ok(None);
        };

        if let Some(next) = patch.status {
            if !current.status.can_transition_to(next) {
                let err = JournalError::InvalidTransition { id, from: current.status, to: next };
                return Err(self.report("update", err).await);
            }
        }

        let merged = current.merged(&patch);
        let result = optimistic(
            self.replace(merged.clone()),
            self.store.bulk_upsert(std::slice::from_ref(&merged)),
            self.replace(current.clone()),
        )
        .await;

        match result {
            Ok(()) => {
                info!(trade_id = %id, status = ?merged.status, "✅ Trade updated");
                self.sink.notify(&JournalEvent::TradeUpdated { trade: Box::new(merged.clone()) });
                Ok(Some(merged))
            }
            Err(e) => Err(self.report("update", e.into()).await),
        }
    }

    // ─── Delete ───────────────────────────────────────────────────────────────

    /// Removes the trade durably and in memory. Returns `Ok(false)` when the
    /// id is unknown; that is not an error.
    pub async fn delete(&self, id: Uuid) -> Result<bool, JournalError> {
        let found = {
            let inner = self.inner.read().await;
            inner
                .trades
                .iter()
                .position(|t| t.id == id)
                .map(|index| (index, inner.trades[index].clone()))
        };
        let Some((index, removed)) = found else {
            debug!(trade_id = %id, "delete skipped: unknown trade");
            return Ok(false);
        };

        let result = optimistic(
            async {
                self.inner.write().await.trades.retain(|t| t.id != id);
            },
            self.store.delete_trade(id),
            self.reinsert(index, removed.clone()),
        )
        .await;

        match result {
            Ok(()) => {
                info!(trade_id = %id, "🗑️ Trade deleted");
                self.sink.notify(&JournalEvent::TradeDeleted { id });
                Ok(true)
            }
            Err(e) => Err(self.report("delete", e.into()).await),
        }
    }

    // ─── Reads ────────────────────────────────────────────────────────────────

    pub async fn stats(&self) -> TradeStats {
        TradeStats::from_trades(&self.inner.read().await.trades)
    }

    pub async fn trades(&self) -> Vec<Trade> {
        self.inner.read().await.trades.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Trade> {
        self.inner.read().await.trades.iter().find(|t| t.id == id).cloned()
    }

    pub async fn account_id(&self) -> Option<String> {
        self.inner.read().await.account_id.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    // ─── Helpers ──────────────────────────────────────────────────────────────

    /// Swap in `trade` for the record with the same id, if still present.
    async fn replace(&self, trade: Trade) {
        let mut inner = self.inner.write().await;
        if let Some(slot) = inner.trades.iter_mut().find(|t| t.id == trade.id) {
            *slot = trade;
        }
    }

    /// Put `trade` back at `index` unless it is already there.
    async fn reinsert(&self, index: usize, trade: Trade) {
        let mut inner = self.inner.write().await;
        if inner.trades.iter().any(|t| t.id == trade.id) {
            return;
        }
        let index = index.min(inner.trades.len());
        inner.trades.insert(index, trade);
        warn!(trade_id = %inner.trades[index].id, "delete rolled back");
    }

    /// Record `err` as the visible error, notify, and hand it back.
    async fn report(&self, operation: &'static str, err: JournalError) -> JournalError {
        error!(operation, error = %err, "journal operation failed");
        self.inner.write().await.last_error = Some(err.to_string());
        self.sink.notify(&JournalEvent::OperationFailed {
            operation,
            message: err.to_string(),
        });
        err
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::StoreError,
        events::testing::RecordingSink,
        models::{Side, TradeStatus},
        store::MemoryStore,
    };

    /// MemoryStore with switchable failures.
    #[derive(Default)]
    struct FlakyStore {
        inner:       MemoryStore,
        fail_reads:  AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn check(flag: &AtomicBool) -> Result<(), StoreError> {
            if flag.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("disk full".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TradeStore for FlakyStore {
        async fn get_trades(&self, account_id: &str) -> Result<Vec<Trade>, StoreError> {
            Self::check(&self.fail_reads)?;
            self.inner.get_trades(account_id).await
        }

        async fn bulk_upsert(&self, trades: &[Trade]) -> Result<(), StoreError> {
            Self::check(&self.fail_writes)?;
            self.inner.bulk_upsert(trades).await
        }

        async fn delete_trade(&self, id: Uuid) -> Result<(), StoreError> {
            Self::check(&self.fail_writes)?;
            self.inner.delete_trade(id).await
        }
    }

    struct Harness {
        journal: TradeJournal,
        store:   Arc<FlakyStore>,
        sink:    Arc<RecordingSink>,
    }

    async fn make_journal() -> Harness {
        let store = Arc::new(FlakyStore::default());
        let sink = Arc::new(RecordingSink::default());
        let journal = TradeJournal::new(store.clone(), sink.clone());
        journal.load("acc-1").await;
        Harness { journal, store, sink }
    }

    fn make_input(symbol: &str) -> NewTrade {
        NewTrade::open(symbol, Side::Buy, 100.0, 1.0)
    }

    #[tokio::test]
    async fn test_load_replaces_set_newest_first() {
        let older = Trade::from_input("acc-1", make_input("AAPL"));
        let mut newer = Trade::from_input("acc-1", make_input("MSFT"));
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        let other = Trade::from_input("acc-2", make_input("TSLA"));

        let store = Arc::new(MemoryStore::with_trades(vec![older.clone(), other, newer.clone()]));
        let sink = Arc::new(RecordingSink::default());
        let journal = TradeJournal::new(store, sink.clone());
        journal.load("acc-1").await;

        assert_eq!(journal.trades().await, vec![newer, older]);
        assert_eq!(journal.account_id().await.as_deref(), Some("acc-1"));
        assert!(!journal.is_loading().await);
        assert_eq!(
            sink.events(),
            vec![JournalEvent::TradesLoaded { account_id: "acc-1".into(), count: 2 }]
        );
    }

    #[tokio::test]
    async fn test_load_failure_is_captured() {
        let h = make_journal().await;
        let trade = h.journal.add(make_input("EURUSD")).await.unwrap();

        h.store.fail_reads.store(true, Ordering::SeqCst);
        h.journal.load("acc-2").await;

        assert!(h.journal.last_error().await.unwrap().contains("disk full"));
        assert_eq!(h.journal.trades().await, vec![trade]);
        assert_eq!(h.journal.account_id().await.as_deref(), Some("acc-1"));
        assert!(!h.journal.is_loading().await);
        assert!(h.sink.events().last().unwrap().is_failure());
    }

    #[tokio::test]
    async fn test_add_requires_account() {
        let journal = TradeJournal::new(Arc::new(MemoryStore::new()), Arc::new(RecordingSink::default()));
        let err = journal.add(make_input("EURUSD")).await.unwrap_err();
        assert!(matches!(err, JournalError::NoAccount));
        assert!(journal.last_error().await.is_some());
    }

    #[tokio::test]
    async fn test_add_prepends_and_persists() {
        let h = make_journal().await;
        let first = h.journal.add(make_input("EURUSD")).await.unwrap();
        let second = h.journal.add(make_input("GBPUSD")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.account_id, "acc-1");
        assert_eq!(h.journal.trades().await, vec![second.clone(), first.clone()]);
        assert_eq!(h.store.inner.snapshot().await, vec![first, second]);
        assert!(matches!(h.sink.events().last(), Some(JournalEvent::TradeAdded { .. })));
    }

    #[tokio::test]
    async fn test_add_failure_leaves_collection_unchanged() {
        let h = make_journal().await;
        h.store.fail_writes.store(true, Ordering::SeqCst);

        let err = h.journal.add(make_input("EURUSD")).await.unwrap_err();
        assert!(matches!(err, JournalError::Store(_)));
        assert!(h.journal.trades().await.is_empty());
        assert!(h.store.inner.snapshot().await.is_empty());
        assert!(h.sink.events().last().unwrap().is_failure());
    }

    #[tokio::test]
    async fn test_add_then_delete_round_trip() {
        let h = make_journal().await;
        let keep = h.journal.add(make_input("USDJPY")).await.unwrap();
        let before_mem = h.journal.trades().await;
        let before_db = h.store.inner.snapshot().await;

        let trade = h.journal.add(make_input("EURUSD")).await.unwrap();
        assert!(h.journal.delete(trade.id).await.unwrap());

        assert_eq!(h.journal.trades().await, before_mem);
        assert_eq!(h.store.inner.snapshot().await, before_db);
        assert_eq!(before_mem, vec![keep]);
        assert_eq!(h.sink.events().last(), Some(&JournalEvent::TradeDeleted { id: trade.id }));
    }

    #[tokio::test]
    async fn test_closing_trade_moves_it_into_stats() {
        let h = make_journal().await;
        let trade = h.journal.add(make_input("BTCUSD")).await.unwrap();
        assert_eq!(h.journal.stats().await.open_trades, 1);

        let patch = TradePatch { status: Some(TradeStatus::Closed), profit: Some(10.0), ..TradePatch::default() };
        let updated = h.journal.update(trade.id, patch).await.unwrap().unwrap();

        let stats = h.journal.stats().await;
        assert_eq!(stats.open_trades, 0);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.total_profit_loss, 10.0);
        assert_eq!(updated.symbol, "BTCUSD");
        assert_eq!(h.store.inner.get_trades("acc-1").await.unwrap(), vec![updated.clone()]);
        assert_eq!(
            h.sink.events().last(),
            Some(&JournalEvent::TradeUpdated { trade: Box::new(updated) })
        );
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let h = make_journal().await;
        h.store.fail_writes.store(true, Ordering::SeqCst);
        let result = h.journal.update(Uuid::new_v4(), TradePatch::close(1.0)).await.unwrap();
        assert!(result.is_none());
        assert!(h.journal.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_update_failure_restores_previous_record() {
        let h = make_journal().await;
        let trade = h.journal.add(make_input("ETHUSD")).await.unwrap();
        h.store.fail_writes.store(true, Ordering::SeqCst);

        let err = h.journal.update(trade.id, TradePatch::close(25.0)).await.unwrap_err();
        assert!(matches!(err, JournalError::Store(_)));
        assert_eq!(h.journal.get(trade.id).await, Some(trade.clone()));
        assert_eq!(h.store.inner.snapshot().await, vec![trade]);
        assert!(matches!(
            h.sink.events().last(),
            Some(JournalEvent::OperationFailed { operation: "update", .. })
        ));
        assert!(!h.sink.events().iter().any(|e| matches!(e, JournalEvent::TradeUpdated { .. })));
    }

    #[tokio::test]
    async fn test_reopening_closed_trade_is_rejected() {
        let h = make_journal().await;
        let trade = h.journal.add(make_input("ETHUSD")).await.unwrap();
        h.journal.update(trade.id, TradePatch::close(5.0)).await.unwrap();

        let reopen = TradePatch { status: Some(TradeStatus::Open), ..TradePatch::default() };
        let err = h.journal.update(trade.id, reopen).await.unwrap_err();
        assert!(matches!(err, JournalError::InvalidTransition { .. }));
        assert!(h.journal.get(trade.id).await.unwrap().is_closed());
        assert!(matches!(
            h.sink.events().last(),
            Some(JournalEvent::OperationFailed { operation: "update", .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let h = make_journal().await;
        let trade = h.journal.add(make_input("SPX500")).await.unwrap();

        assert!(!h.journal.delete(Uuid::new_v4()).await.unwrap());
        assert_eq!(h.journal.trades().await, vec![trade]);
    }

    #[tokio::test]
    async fn test_delete_failure_reinserts_in_place() {
        let h = make_journal().await;
        let a = h.journal.add(make_input("A")).await.unwrap();
        let b = h.journal.add(make_input("B")).await.unwrap();
        let c = h.journal.add(make_input("C")).await.unwrap();
        h.store.fail_writes.store(true, Ordering::SeqCst);

        assert!(h.journal.delete(b.id).await.is_err());
        assert_eq!(h.journal.trades().await, vec![c, b, a]);
        assert_eq!(h.store.inner.snapshot().await.len(), 3);
        assert!(matches!(
            h.sink.events().last(),
            Some(JournalEvent::OperationFailed { operation: "delete", .. })
        ));
        assert!(!h.sink.events().iter().any(|e| matches!(e, JournalEvent::TradeDeleted { .. })));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_external_writes() {
        let h = make_journal().await;
        let external = Trade::from_input("acc-1", make_input("OIL"));
        h.store.inner.bulk_upsert(std::slice::from_ref(&external)).await.unwrap();

        h.journal.refresh().await;
        assert_eq!(h.journal.trades().await, vec![external]);
    }

    #[tokio::test]
    async fn test_refresh_without_account_replaces_stale_error() {
        let store = Arc::new(FlakyStore::default());
        let sink = Arc::new(RecordingSink::default());
        let journal = TradeJournal::new(store.clone(), sink.clone());

        store.fail_reads.store(true, Ordering::SeqCst);
        journal.load("acc-1").await;
        assert!(journal.last_error().await.unwrap().contains("disk full"));

        store.fail_reads.store(false, Ordering::SeqCst);
        journal.refresh().await;

        assert_eq!(journal.last_error().await.as_deref(), Some("no account loaded"));
        assert!(journal.account_id().await.is_none());
        assert!(matches!(
            sink.events().last(),
            Some(JournalEvent::OperationFailed { operation: "refresh", .. })
        ));
    }
}
