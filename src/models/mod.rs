//! Domain models shared across the journal, the store and the HTTP layer.

pub mod trade;

pub use trade::{NewTrade, Side, Trade, TradePatch, TradeStatus};
