//! # store — Persistence collaborator for the journal
//!
//! The journal only ever talks to a [`TradeStore`]. Each call is expected to
//! be atomic and durable on its own: once `bulk_upsert` returns `Ok`, a later
//! `get_trades` sees the write.
//!
//! | Backend           | Use                                     |
//! |-------------------|-----------------------------------------|
//! | [`MemoryStore`]   | tests and ephemeral runs                |
//! | [`JsonFileStore`] | single-user local journal on disk       |

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::StoreError, models::Trade};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// All trades for `account_id`, most recent first.
    async fn get_trades(&self, account_id: &str) -> Result<Vec<Trade>, StoreError>;

    /// Insert-or-replace by `Trade::id`.
    async fn bulk_upsert(&self, trades: &[Trade]) -> Result<(), StoreError>;

    /// Removing an id that does not exist is not an error.
    async fn delete_trade(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Upsert `incoming` into `existing` by id, keeping the position of records
/// that are already there.
pub(crate) fn upsert_into(existing: &mut Vec<Trade>, incoming: &[Trade]) {
    for trade in incoming {
        match existing.iter_mut().find(|t| t.id == trade.id) {
            Some(slot) => *slot = trade.clone(),
            None => existing.push(trade.clone()),
        }
    }
}

/// Filter to one account and order newest first.
pub(crate) fn select_account(all: &[Trade], account_id: &str) -> Vec<Trade> {
    let mut trades: Vec<Trade> = all
        .iter()
        .filter(|t| t.account_id == account_id)
        .cloned()
        .collect();
    trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    trades
}
