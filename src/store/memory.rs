//! # store::memory
//!
//! In-process [`TradeStore`]. Nothing survives a restart.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{select_account, upsert_into, TradeStore};
use crate::{error::StoreError, models::Trade};

#[derive(Debug, Default)]
pub struct MemoryStore {
    trades: RwLock<Vec<Trade>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `trades` (any accounts).
    pub fn with_trades(trades: Vec<Trade>) -> Self {
        Self { trades: RwLock::new(trades) }
    }

    /// Every record across all accounts, in insertion order.
    pub async fn snapshot(&self) -> Vec<Trade> {
        self.trades.read().await.clone()
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn get_trades(&self, account_id: &str) -> Result<Vec<Trade>, StoreError> {
        let trades = self.trades.read().await;
        Ok(select_account(&trades, account_id))
    }

    async fn bulk_upsert(&self, incoming: &[Trade]) -> Result<(), StoreError> {
        let mut trades = self.trades.write().await;
        upsert_into(&mut trades, incoming);
        Ok(())
    }

    async fn delete_trade(&self, id: Uuid) -> Result<(), StoreError> {
        let mut trades = self.trades.write().await;
        trades.retain(|t| t.id != id);
        Ok(())
    }
}
