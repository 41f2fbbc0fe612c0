//! Performance summary over a closed-trade log

use serde::Serialize;

use crate::types::ClosedTrade;

/// Aggregates computed once over the trade log, in trade-close order
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub winrate_pct: f64,
    pub total_pnl: f64,
    pub final_balance: f64,
    pub return_pct: f64,
    /// Largest peak-to-trough equity decline, in account currency
    pub max_drawdown: f64,
}

/// Walk the equity curve trade by trade. Break-even trades count as wins.
pub fn compute_metrics(initial_balance: f64, trades: &[ClosedTrade]) -> Metrics {
    let mut equity = initial_balance;
    let mut peak = initial_balance;
    let mut max_drawdown = 0.0;
    let mut wins = 0usize;
    let mut losses = 0usize;

    for trade in trades {
        equity += trade.pnl;
        if trade.pnl >= 0.0 {
            wins += 1;
        } else {
            losses += 1;
        }
        if equity > peak {
            peak = equity;
        }
        let dd = peak - equity;
        if dd > max_drawdown {
            max_drawdown = dd;
        }
    }

    let total_pnl = equity - initial_balance;
    let winrate_pct = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64 * 100.0
    };
    let return_pct = if initial_balance != 0.0 {
        total_pnl / initial_balance * 100.0
    } else {
        0.0
    };

    Metrics {
        trades: trades.len(),
        wins,
        losses,
        winrate_pct,
        total_pnl,
        final_balance: equity,
        return_pct,
        max_drawdown,
    }
}
