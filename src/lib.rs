//! # Risk Coach — trading journal core
//!
//! Two independent layers sit behind the dashboard:
//!
//! - **Request cache** ([`perf::RequestCache`]) — TTL memoization with
//!   at-most-one in-flight producer per key, plus keyed debouncing
//! - **Trade journal** ([`journal::TradeJournal`]) — one account's trades in
//!   memory, kept in step with a [`store::TradeStore`], with on-demand
//!   [`stats::TradeStats`]
//!
//! The binary wires both into an Axum server (see [`routes`]).

pub mod config;
pub mod error;
pub mod events;
pub mod journal;
pub mod market;
pub mod models;
pub mod perf;
pub mod routes;
pub mod state;
pub mod stats;
pub mod store;

pub use error::{AppError, FetchError, JournalError, StoreError};
pub use journal::TradeJournal;
pub use perf::{Debouncer, RequestCache};
pub use stats::TradeStats;
