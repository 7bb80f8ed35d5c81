//! # market — cached dashboard data
//!
//! Market quotes and AI-coach status come from upstream HTTP services; the
//! portfolio snapshot is built from the journal. Every read goes through the
//! shared [`RequestCache`] so repeated dashboard polls and simultaneous
//! widgets cost one producer run per TTL window.
//!
//! | Cache key              | Source                            |
//! |------------------------|-----------------------------------|
//! | `market_data`          | `GET {MARKET_URL}/overview`       |
//! | `market_data:{SYMBOL}` | `GET {MARKET_URL}/quote/{SYMBOL}` |
//! | `ai_status`            | `GET {AI_STATUS_URL}`             |
//! | `user_portfolio`       | journal stats + open positions    |

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{error::FetchError, journal::TradeJournal, perf::RequestCache};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Invalidated by every journal write that goes through the HTTP surface.
pub const PORTFOLIO_KEY: &str = "user_portfolio";

#[derive(Debug, Clone)]
pub struct MarketClient {
    http:          reqwest::Client,
    market_url:    Option<String>,
    ai_status_url: Option<String>,
}

impl MarketClient {
    pub fn new(http: reqwest::Client, market_url: Option<String>, ai_status_url: Option<String>) -> Self {
        Self { http, market_url, ai_status_url }
    }

    /// Latest quote for `symbol`, cached under `market_data:{SYMBOL}`.
    pub async fn quote(
        &self,
        cache: &RequestCache<Value>,
        symbol: &str,
        ttl: Duration,
    ) -> Result<Value, FetchError> {
        let symbol = symbol.to_uppercase();
        let key = format!("market_data:{symbol}");
        let url = self.market_endpoint(&format!("quote/{symbol}"));
        let http = self.http.clone();
        cache.get_or_fetch(&key, move || get_json(http, url), ttl).await
    }

    pub async fn overview(&self, cache: &RequestCache<Value>, ttl: Duration) -> Result<Value, FetchError> {
        let url = self.market_endpoint("overview");
        let http = self.http.clone();
        cache.get_or_fetch("market_data", move || get_json(http, url), ttl).await
    }

    pub async fn ai_status(&self, cache: &RequestCache<Value>, ttl: Duration) -> Result<Value, FetchError> {
        let url = self.ai_status_url.clone().context("AI_STATUS_URL is not configured");
        let http = self.http.clone();
        cache.get_or_fetch("ai_status", move || get_json(http, url), ttl).await
    }

    fn market_endpoint(&self, path: &str) -> anyhow::Result<String> {
        let base = self
            .market_url
            .as_deref()
            .context("MARKET_URL is not configured")?;
        Ok(format!("{}/{path}", base.trim_end_matches('/')))
    }
}

async fn get_json(http: reqwest::Client, url: anyhow::Result<String>) -> anyhow::Result<Value> {
    let url = url?;
    debug!(%url, "upstream GET");

    let resp = http
        .get(&url)
        .timeout(UPSTREAM_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("{url} unreachable"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("{url} returned HTTP {status}: {body}");
    }

    resp.json().await.with_context(|| format!("{url} returned invalid JSON"))
}

/// Balance, stats and open positions of the loaded account, cached under
/// [`PORTFOLIO_KEY`].
pub async fn portfolio(
    cache: &RequestCache<Value>,
    journal: &Arc<TradeJournal>,
    ttl: Duration,
) -> Result<Value, FetchError> {
    let journal = Arc::clone(journal);
    cache.get_or_fetch(PORTFOLIO_KEY, move || portfolio_snapshot(journal), ttl).await
}

async fn portfolio_snapshot(journal: Arc<TradeJournal>) -> anyhow::Result<Value> {
    let account_id = journal.account_id().await.context("no account loaded")?;
    let stats = journal.stats().await;
    let open: Vec<_> = journal.trades().await.into_iter().filter(|t| t.is_open()).collect();

    Ok(serde_json::json!({
        "account_id":     account_id,
        "balance":        stats.total_profit_loss,
        "open_positions": open,
        "stats":          stats,
    }))
}

/// Warms the cache with the data every dashboard opens with. Runs the
/// fetches concurrently; failures are logged and otherwise ignored.
pub async fn preload_critical_data(
    client: &MarketClient,
    journal: &Arc<TradeJournal>,
    cache: &RequestCache<Value>,
    ttl: Duration,
) {
    let (overview, holdings, ai) = tokio::join!(
        client.overview(cache, ttl),
        portfolio(cache, journal, ttl),
        client.ai_status(cache, ttl),
    );

    let results = [("market_data", overview), (PORTFOLIO_KEY, holdings), ("ai_status", ai)];
    let total = results.len();
    let mut loaded = 0;
    for (key, result) in results {
        match result {
            Ok(_) => loaded += 1,
            Err(e) => warn!(key, error = %e, "Failed to preload"),
        }
    }

    info!(loaded, total, "Critical data preloaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::testing::RecordingSink,
        models::{NewTrade, Side},
        store::MemoryStore,
    };

    fn make_client(market_url: Option<&str>) -> MarketClient {
        MarketClient::new(reqwest::Client::new(), market_url.map(str::to_string), None)
    }

    #[test]
    fn test_market_endpoint_joins_paths() {
        let client = make_client(Some("http://localhost:8081/"));
        assert_eq!(client.market_endpoint("quote/EURUSD").unwrap(), "http://localhost:8081/quote/EURUSD");
    }

    #[tokio::test]
    async fn test_unconfigured_upstream_fails_without_caching() {
        let client = make_client(None);
        let cache = RequestCache::new();

        let err = client.quote(&cache, "eurusd", Duration::from_secs(30)).await.unwrap_err();
        assert!(err.to_string().contains("MARKET_URL"));
        assert!(cache.is_empty());
        assert_eq!(cache.metrics().failures, 1);
    }

    #[tokio::test]
    async fn test_cached_quote_skips_upstream() {
        let client = make_client(None);
        let cache = RequestCache::new();
        cache
            .get_or_fetch("market_data:EURUSD", || async { Ok(serde_json::json!({ "bid": 1.08 })) }, Duration::from_secs(30))
            .await
            .unwrap();

        let quote = client.quote(&cache, "eurusd", Duration::from_secs(30)).await.unwrap();
        assert_eq!(quote["bid"], 1.08);
    }

    async fn make_journal(account: Option<&str>) -> Arc<TradeJournal> {
        let journal = TradeJournal::new(Arc::new(MemoryStore::new()), Arc::new(RecordingSink::default()));
        if let Some(account) = account {
            journal.load(account).await;
        }
        Arc::new(journal)
    }

    #[tokio::test]
    async fn test_preload_warms_portfolio_despite_upstream_failures() {
        let client = make_client(None);
        let cache = RequestCache::new();
        let journal = make_journal(Some("acc-1")).await;
        journal.add(NewTrade::open("EURUSD", Side::Buy, 1.08, 1.0)).await.unwrap();

        preload_critical_data(&client, &journal, &cache, Duration::from_secs(30)).await;

        let metrics = cache.metrics();
        assert_eq!(metrics.misses, 3);
        assert_eq!(metrics.failures, 2);
        let snapshot = cache.get(PORTFOLIO_KEY).unwrap();
        assert_eq!(snapshot["account_id"], "acc-1");
        assert_eq!(snapshot["open_positions"].as_array().unwrap().len(), 1);
        assert!(cache.get("market_data").is_none());
    }

    #[tokio::test]
    async fn test_portfolio_requires_loaded_account() {
        let cache = RequestCache::new();
        let journal = make_journal(None).await;

        let err = portfolio(&cache, &journal, Duration::from_secs(30)).await.unwrap_err();
        assert!(err.to_string().contains("no account loaded"));
        assert!(cache.is_empty());
    }
}
