//! # perf — request caching, dedup and UI responsiveness helpers
//!
//! - [`RequestCache`] memoizes async results by key with a TTL and collapses
//!   concurrent requests for the same key into one in-flight call
//! - [`Debouncer`] keeps only the last action scheduled under a key
//! - [`optimistic`] apply / await / commit-or-rollback
//! - [`timed`] duration logging around a future

pub mod cache;
pub mod debounce;
pub mod optimistic;
pub mod timing;

pub use cache::{CacheMetrics, RequestCache};
pub use debounce::Debouncer;
pub use optimistic::optimistic;
pub use timing::timed;
