//! # Risk Coach — trading journal server
//!
//! ```text
//!  ┌─────────────┐  /api/trades/*        ┌───────────────────────────────┐
//!  │  Dashboard  │ ────────────────────▶ │ AppState                      │
//!  │  (browser)  │                       │ ├─ journal ──▶ TradeStore     │
//!  └─────────────┘                       │ ├─ cache   ──▶ upstream HTTP  │
//!        ▲          /api/market/*        │ ├─ debouncer                  │
//!        │          /api/ai/status       │ └─ notifier ────────────────┐ │
//!        │                               └─────────────────────────────┼─┘
//!        └──────────── ws://host/ws/notifications ◀────────────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                 | Default         | Description                         |
//! |--------------------------|-----------------|-------------------------------------|
//! | `BIND_ADDR`              | `0.0.0.0:3000`  | Address Axum listens on             |
//! | `ACCOUNT_ID`             | `default`       | Account loaded at startup           |
//! | `TRADE_STORE_PATH`       | —               | JSON trade file (in-memory if unset) |
//! | `MARKET_URL`             | —               | Market-data upstream                |
//! | `AI_STATUS_URL`          | —               | AI-coach status upstream            |
//! | `CACHE_DEFAULT_TTL_SECS` | `300`           | Default cache TTL                   |
//! | `CACHE_QUICK_TTL_SECS`   | `30`            | Preload / AI status TTL             |
//! | `CACHE_SWEEP_SECS`       | `600`           | Expired-entry sweep interval        |
//! | `DEBOUNCE_MS`            | `300`           | Ping debounce window                |
//! | `RUST_LOG`               | `riskcoach=debug` | Tracing filter                    |

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use riskcoach::{config::Config, market::preload_critical_data, routes, state::build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("riskcoach=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║           RISK COACH — Trading Journal                ║
  ║  Journal · Stats · Cache · Notifications              ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Config & shared state ──────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load config")?;
    let addr = config.bind_addr;
    let state = build_state(config);

    info!(
        account   = %state.config.account_id,
        store     = ?state.config.trade_store_path,
        market    = ?state.config.market_url,
        "Config loaded"
    );

    // ── 4. Warm up ────────────────────────────────────────────────────────────
    state.journal.load(&state.config.account_id).await;
    let _sweeper = state.cache.spawn_sweeper(state.config.cache_sweep_every);
    {
        let state = state.clone();
        tokio::spawn(async move {
            preload_critical_data(
                &state.market,
                &state.journal,
                &state.cache,
                state.config.cache_quick_ttl,
            )
            .await;
        });
    }

    // ── 5. CORS ───────────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 6. Router ─────────────────────────────────────────────────────────────
    let app = routes::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // ── 7. Bind & Serve ───────────────────────────────────────────────────────
    info!(?addr, "🚀 Risk Coach server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received, shutting down gracefully");
}
