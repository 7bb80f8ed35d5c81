//! # stats
//!
//! [`TradeStats`] — summary numbers for the dashboard, derived on demand
//! from a slice of trades. Nothing here is stored; the same input always
//! yields the same output.
//!
//! Realized figures only look at `Closed` trades. A closed trade without a
//! recorded profit counts as a zero-P&L trade.

use serde::Serialize;

use crate::models::Trade;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeStats {
    /// Number of closed trades.
    pub total_trades:        usize,
    pub winning_trades:      usize,
    pub losing_trades:       usize,
    /// Percentage in `[0, 100]`; 0 when there are no closed trades.
    pub win_rate:            f64,
    pub total_profit_loss:   f64,
    pub average_profit_loss: f64,
    /// Never negative.
    pub largest_win:         f64,
    /// Never positive.
    pub largest_loss:        f64,
    /// Largest peak-to-trough drop of cumulative realized P&L. Never negative.
    pub max_drawdown:        f64,
    /// Counted over every trade, not just closed ones.
    pub open_trades:         usize,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
        let profits = || closed.iter().map(|t| t.profit.unwrap_or(0.0));

        let total_trades   = closed.len();
        let winning_trades = profits().filter(|p| *p > 0.0).count();
        let losing_trades  = profits().filter(|p| *p < 0.0).count();
        let total_profit_loss: f64 = profits().sum();

        let (win_rate, average_profit_loss) = if total_trades == 0 {
            (0.0, 0.0)
        } else {
            (
                winning_trades as f64 / total_trades as f64 * 100.0,
                total_profit_loss / total_trades as f64,
            )
        };

        Self {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_profit_loss,
            average_profit_loss,
            largest_win:  profits().fold(0.0, f64::max),
            largest_loss: profits().fold(0.0, f64::min),
            max_drawdown: max_drawdown(&closed),
            open_trades:  trades.iter().filter(|t| t.is_open()).count(),
        }
    }
}

/// Walks closed trades in settlement order and tracks the deepest fall
/// below the running peak. The curve starts at 0.
fn max_drawdown(closed: &[&Trade]) -> f64 {
    let mut ordered: Vec<&&Trade> = closed.iter().collect();
    ordered.sort_by_key(|t| t.settled_at());

    let mut peak = 0.0_f64;
    let mut running = 0.0_f64;
    let mut worst = 0.0_f64;

    for trade in ordered {
        running += trade.profit.unwrap_or(0.0);
        peak = peak.max(running);
        worst = worst.max(peak - running);
    }
    worst
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTrade, Side, TradePatch, TradeStatus};
    use chrono::{Duration, Utc};

    fn make_open() -> Trade {
        Trade::from_input("acc", NewTrade::open("BTCUSD", Side::Buy, 67000.0, 0.1))
    }

    /// Closed trades settled one minute apart, in the given order.
    fn make_closed(profits: &[Option<f64>]) -> Vec<Trade> {
        let start = Utc::now();
        profits
            .iter()
            .enumerate()
            .map(|(i, profit)| {
                let mut trade = make_open();
                trade.status = TradeStatus::Closed;
                trade.profit = *profit;
                trade.exit_time = Some(start + Duration::minutes(i as i64));
                trade
            })
            .collect()
    }

    #[test]
    fn test_empty_set() {
        let stats = TradeStats::from_trades(&[]);
        assert_eq!(stats, TradeStats::default());
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.largest_win, 0.0);
        assert_eq!(stats.largest_loss, 0.0);
    }

    #[test]
    fn test_mixed_profits() {
        let trades = make_closed(&[Some(100.0), Some(-50.0), Some(0.0), Some(200.0)]);
        let stats = TradeStats::from_trades(&trades);

        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.win_rate, 50.0);
        assert_eq!(stats.total_profit_loss, 250.0);
        assert_eq!(stats.average_profit_loss, 62.5);
        assert_eq!(stats.largest_win, 200.0);
        assert_eq!(stats.largest_loss, -50.0);
        assert_eq!(stats.max_drawdown, 50.0);
        assert_eq!(stats.open_trades, 0);
    }

    #[test]
    fn test_open_trades_excluded_from_pnl() {
        let mut trades = make_closed(&[Some(30.0)]);
        let mut open = make_open();
        open.profit = Some(999.0);
        trades.push(open);
        trades.push(make_open());

        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.total_profit_loss, 30.0);
        assert_eq!(stats.open_trades, 2);
    }

    #[test]
    fn test_missing_profit_counts_as_zero() {
        let trades = make_closed(&[None, Some(-20.0)]);
        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.average_profit_loss, -10.0);
    }

    #[test]
    fn test_all_losses_never_report_positive_win() {
        let trades = make_closed(&[Some(-10.0), Some(-40.0)]);
        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.largest_win, 0.0);
        assert_eq!(stats.largest_loss, -40.0);
        assert_eq!(stats.max_drawdown, 50.0);
    }

    #[test]
    fn test_closing_moves_trade_into_aggregates() {
        let open = make_open();
        let before = TradeStats::from_trades(std::slice::from_ref(&open));
        let closed = open.merged(&TradePatch::close(10.0));
        let after = TradeStats::from_trades(&[closed]);

        assert_eq!(before.open_trades, 1);
        assert_eq!(after.open_trades, 0);
        assert_eq!(after.total_trades, 1);
        assert_eq!(after.total_profit_loss, 10.0);
    }

    #[test]
    fn test_drawdown_uses_settlement_order() {
        // Given out of order: chronologically +100, -80, +10
        let mut trades = make_closed(&[Some(100.0), Some(-80.0), Some(10.0)]);
        trades.reverse();
        let stats = TradeStats::from_trades(&trades);
        assert_eq!(stats.max_drawdown, 80.0);
    }
}
