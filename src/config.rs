//! # config — read Config from environment variables

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:         SocketAddr,
    /// Account loaded into the journal on startup.
    pub account_id:        String,
    /// JSON file for the trade store; `None` keeps trades in memory only.
    pub trade_store_path:  Option<PathBuf>,
    /// Upstream market-data base URL, e.g. `http://localhost:8081`.
    pub market_url:        Option<String>,
    pub ai_status_url:     Option<String>,
    pub cache_default_ttl: Duration,
    /// TTL for the startup preload.
    pub cache_quick_ttl:   Duration,
    pub cache_sweep_every: Duration,
    pub debounce_delay:    Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr:         env_parse("BIND_ADDR", "0.0.0.0:3000")?,
            account_id:        std::env::var("ACCOUNT_ID").unwrap_or_else(|_| "default".to_string()),
            trade_store_path:  std::env::var("TRADE_STORE_PATH").ok().map(PathBuf::from),
            market_url:        std::env::var("MARKET_URL").ok(),
            ai_status_url:     std::env::var("AI_STATUS_URL").ok(),
            cache_default_ttl: Duration::from_secs(env_parse("CACHE_DEFAULT_TTL_SECS", "300")?),
            cache_quick_ttl:   Duration::from_secs(env_parse("CACHE_QUICK_TTL_SECS", "30")?),
            cache_sweep_every: Duration::from_secs(env_parse("CACHE_SWEEP_SECS", "600")?),
            debounce_delay:    Duration::from_millis(env_parse("DEBOUNCE_MS", "300")?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr:         SocketAddr::from(([0, 0, 0, 0], 3000)),
            account_id:        "default".to_string(),
            trade_store_path:  None,
            market_url:        None,
            ai_status_url:     None,
            cache_default_ttl: Duration::from_secs(300),
            cache_quick_ttl:   Duration::from_secs(30),
            cache_sweep_every: Duration::from_secs(600),
            debounce_delay:    Duration::from_millis(300),
        }
    }
}

fn env_parse<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .with_context(|| format!("{key} has an invalid value: '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_uses_default_when_unset() {
        let value: u64 = env_parse("RISKCOACH_TEST_UNSET_VAR", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        let err = env_parse::<u64>("RISKCOACH_TEST_UNSET_VAR", "soon").unwrap_err();
        assert!(err.to_string().contains("RISKCOACH_TEST_UNSET_VAR"));
    }
}
