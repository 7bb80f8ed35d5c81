//! # store::json_file
//!
//! [`TradeStore`] backed by a single JSON array file holding every account's
//! trades — the on-disk equivalent of the browser's local database.
//!
//! Writes are read-modify-write under one async mutex and land via a temp
//! file + rename, so a crash mid-write leaves the previous file intact.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{select_account, upsert_into, TradeStore};
use crate::{error::StoreError, models::Trade};

#[derive(Debug)]
pub struct JsonFileStore {
    path:  PathBuf,
    write: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:  path.into(),
            write: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Trade>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, trades: &[Trade]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(trades)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = trades.len(), "trade file written");
        Ok(())
    }
}

#[async_trait]
impl TradeStore for JsonFileStore {
    async fn get_trades(&self, account_id: &str) -> Result<Vec<Trade>, StoreError> {
        let all = self.read_all().await?;
        Ok(select_account(&all, account_id))
    }

    async fn bulk_upsert(&self, incoming: &[Trade]) -> Result<(), StoreError> {
        let _guard = self.write.lock().await;
        let mut all = self.read_all().await?;
        upsert_into(&mut all, incoming);
        self.write_all(&all).await
    }

    async fn delete_trade(&self, id: Uuid) -> Result<(), StoreError> {
        let _guard = self.write.lock().await;
        let mut all = self.read_all().await?;
        let before = all.len();
        all.retain(|t| t.id != id);
        if all.len() == before {
            return Ok(());
        }
        self.write_all(&all).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTrade, Side};

    fn make_trade(account: &str) -> Trade {
        Trade::from_input(account, NewTrade::open("NAS100", Side::Buy, 18250.0, 2.0))
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("trades.json"));
        assert!(store.get_trades("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("trades.json");
        let trade = make_trade("a");

        JsonFileStore::new(&path)
            .bulk_upsert(std::slice::from_ref(&trade))
            .await
            .unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get_trades("a").await.unwrap(), vec![trade]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("trades.json"));
        let keep = make_trade("a");
        let drop = make_trade("a");
        store.bulk_upsert(&[keep.clone(), drop.clone()]).await.unwrap();

        store.delete_trade(drop.id).await.unwrap();
        store.delete_trade(Uuid::new_v4()).await.unwrap();

        assert_eq!(store.get_trades("a").await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = JsonFileStore::new(&path).get_trades("a").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
