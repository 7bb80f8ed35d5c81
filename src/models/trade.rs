//! # models::trade
//!
//! Defines the journal's trade records.
//!
//! `Trade`      = one logged trade, owned in memory by the journal and
//!                durably by the [`TradeStore`](crate::store::TradeStore)
//! `NewTrade`   = caller input for `add` (no id, no account, no timestamps)
//! `TradePatch` = explicit partial update for `update`; every `Some` field
//!                overwrites, every `None` field keeps the stored value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Side ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

// ─── TradeStatus ──────────────────────────────────────────────────────────────

/// Lifecycle of a journal entry. Only `Open → Closed` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    /// Returns `true` if a record in `self` may be moved to `next`.
    #[inline]
    pub fn can_transition_to(self, next: TradeStatus) -> bool {
        !matches!((self, next), (TradeStatus::Closed, TradeStatus::Open))
    }
}

// ─── Trade ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id:          Uuid,
    pub account_id:  String,
    pub symbol:      String,
    pub side:        Side,
    pub entry_price: f64,
    pub quantity:    f64,
    pub exit_price:  Option<f64>,
    pub status:      TradeStatus,
    /// Realized P&L in account currency. `None` while the trade is open
    /// or when the user never recorded it.
    pub profit:      Option<f64>,
    pub stop_loss:   Option<f64>,
    pub take_profit: Option<f64>,
    pub entry_time:  DateTime<Utc>,
    pub exit_time:   Option<DateTime<Utc>>,
    pub notes:       Option<String>,
    pub strategy:    Option<String>,
    #[serde(default)]
    pub tags:        Vec<String>,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

impl Trade {
    /// Builds a fresh record for `account_id` with a new unique id.
    pub fn from_input(account_id: &str, input: NewTrade) -> Self {
        let now = Utc::now();
        Self {
            id:          Uuid::new_v4(),
            account_id:  account_id.to_string(),
            symbol:      input.symbol,
            side:        input.side,
            entry_price: input.entry_price,
            quantity:    input.quantity,
            exit_price:  input.exit_price,
            status:      input.status.unwrap_or(TradeStatus::Open),
            profit:      input.profit,
            stop_loss:   input.stop_loss,
            take_profit: input.take_profit,
            entry_time:  input.entry_time.unwrap_or(now),
            exit_time:   input.exit_time,
            notes:       input.notes,
            strategy:    input.strategy,
            tags:        input.tags,
            created_at:  now,
            updated_at:  now,
        }
    }

    /// Returns a copy of `self` with every field present in `patch` applied.
    ///
    /// `id`, `account_id` and `created_at` are never touched; `updated_at` is
    /// bumped to now.
    pub fn merged(&self, patch: &TradePatch) -> Self {
        let mut next = self.clone();
        if let Some(symbol) = &patch.symbol           { next.symbol = symbol.clone(); }
        if let Some(side) = patch.side                { next.side = side; }
        if let Some(price) = patch.entry_price        { next.entry_price = price; }
        if let Some(quantity) = patch.quantity        { next.quantity = quantity; }
        if let Some(price) = patch.exit_price         { next.exit_price = Some(price); }
        if let Some(status) = patch.status            { next.status = status; }
        if let Some(profit) = patch.profit            { next.profit = Some(profit); }
        if let Some(sl) = patch.stop_loss             { next.stop_loss = Some(sl); }
        if let Some(tp) = patch.take_profit           { next.take_profit = Some(tp); }
        if let Some(time) = patch.entry_time          { next.entry_time = time; }
        if let Some(time) = patch.exit_time           { next.exit_time = Some(time); }
        if let Some(notes) = &patch.notes             { next.notes = Some(notes.clone()); }
        if let Some(strategy) = &patch.strategy       { next.strategy = Some(strategy.clone()); }
        if let Some(tags) = &patch.tags               { next.tags = tags.clone(); }
        next.updated_at = Utc::now();
        next
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Time used to order closed trades on the equity curve.
    #[inline]
    pub fn settled_at(&self) -> DateTime<Utc> {
        self.exit_time.unwrap_or(self.entry_time)
    }
}

// ─── NewTrade ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub symbol:      String,
    pub side:        Side,
    pub entry_price: f64,
    pub quantity:    f64,
    #[serde(default)]
    pub exit_price:  Option<f64>,
    /// Defaults to `Open`. Historical imports may log already-closed trades.
    #[serde(default)]
    pub status:      Option<TradeStatus>,
    #[serde(default)]
    pub profit:      Option<f64>,
    #[serde(default)]
    pub stop_loss:   Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub entry_time:  Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_time:   Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes:       Option<String>,
    #[serde(default)]
    pub strategy:    Option<String>,
    #[serde(default)]
    pub tags:        Vec<String>,
}

impl NewTrade {
    /// Minimal open trade; the remaining fields can be set with struct update syntax.
    pub fn open(symbol: &str, side: Side, entry_price: f64, quantity: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            entry_price,
            quantity,
            exit_price:  None,
            status:      None,
            profit:      None,
            stop_loss:   None,
            take_profit: None,
            entry_time:  None,
            exit_time:   None,
            notes:       None,
            strategy:    None,
            tags:        Vec::new(),
        }
    }
}

// ─── TradePatch ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradePatch {
    pub symbol:      Option<String>,
    pub side:        Option<Side>,
    pub entry_price: Option<f64>,
    pub quantity:    Option<f64>,
    pub exit_price:  Option<f64>,
    pub status:      Option<TradeStatus>,
    pub profit:      Option<f64>,
    pub stop_loss:   Option<f64>,
    pub take_profit: Option<f64>,
    pub entry_time:  Option<DateTime<Utc>>,
    pub exit_time:   Option<DateTime<Utc>>,
    pub notes:       Option<String>,
    pub strategy:    Option<String>,
    pub tags:        Option<Vec<String>>,
}

impl TradePatch {
    /// Patch that closes a trade with the given realized profit.
    pub fn close(profit: f64) -> Self {
        Self {
            status: Some(TradeStatus::Closed),
            profit: Some(profit),
            exit_time: Some(Utc::now()),
            ..Self::default()
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
