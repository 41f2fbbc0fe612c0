//! Bar-by-bar backtest engine
//!
//! Replays the decision series against the strategy and the fill model. Each
//! bar first manages the open position, then applies the daily loss gate, and
//! only then asks for a new entry, so a bar never both exits and re-enters.
//! Position sizing in the simulator comes from the trade-management config;
//! the signal's risk-sized lot suggestion is informational.

mod metrics;

pub use metrics::{compute_metrics, Metrics};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::{AppConfig, Tp1Mode};
use crate::execution::{FillModel, Position};
use crate::profile::SessionProfileCache;
use crate::series::BarFrame;
use crate::strategy::VpStrategy;
use crate::types::{Bar, ClosedTrade};

pub struct BacktestReport {
    pub metrics: Metrics,
    pub trades: Vec<ClosedTrade>,
}

pub struct BacktestEngine {
    cfg: AppConfig,
}

impl BacktestEngine {
    pub fn new(cfg: AppConfig) -> Self {
        Self { cfg }
    }

    /// Run over minute bars (profile input) and decision bars.
    pub fn run(&self, bars_m1: Vec<Bar>, bars_m15: Vec<Bar>) -> Result<BacktestReport> {
        let tz = self.cfg.timezone()?;
        let frame = BarFrame::new(bars_m15, tz, self.cfg.rules.atr_period);
        let mut cache = SessionProfileCache::new(bars_m1, tz, self.cfg.vp.clone());
        let mut strategy = VpStrategy::new(&self.cfg)?;
        let fill = FillModel::new(&self.cfg.fill, &self.cfg.symbol);
        let tm = &self.cfg.trade_management;

        let mut balance = self.cfg.account.initial_balance;
        let mut trades: Vec<ClosedTrade> = Vec::new();
        let mut position: Option<Position> = None;

        let mut cur_day: Option<NaiveDate> = None;
        let mut consec_loss = 0usize;
        let mut day_blocked = false;

        for i in 0..frame.len() {
            let day = frame.local_day(i);
            if cur_day != Some(day) {
                cur_day = Some(day);
                consec_loss = 0;
                day_blocked = false;
            }

            let bar = frame.bar(i);
            let atr = frame.atr(i).unwrap_or(0.0);

            // 1) Manage the open position
            if let Some(pos) = position.take() {
                match pos.check_bar(bar.high, bar.low, &fill) {
                    Some(intent) => {
                        let (pos, update) = pos.apply_exit(intent, atr, tm, &fill, bar.time);
                        balance += update.realized_pnl;
                        if update.closed_all {
                            consec_loss = if pos.realized_pnl < 0.0 {
                                consec_loss + 1
                            } else {
                                0
                            };
                            debug!(
                                event = %update.event,
                                pnl = pos.realized_pnl,
                                balance,
                                "trade closed"
                            );
                            if let Some(trade) = pos.into_closed() {
                                trades.push(trade);
                            }
                        } else {
                            position = Some(pos);
                        }
                    }
                    None => position = Some(pos),
                }
            }

            // 2) Daily loss gate
            if day_blocked {
                continue;
            }
            if consec_loss >= self.cfg.risk.max_consecutive_loss {
                day_blocked = true;
                info!(%day, consec_loss, "entries blocked for the rest of the day");
                continue;
            }

            // 3) New entry only when flat
            if position.is_none() {
                let eval = strategy.get_signal(i, &frame, &mut cache, balance);
                if let Some(sig) = eval.signal {
                    let entry_filled = fill.entry_fill(sig.direction, sig.entry_price);
                    let tp1 = sig.tp1.unwrap_or_else(|| match tm.tp1_mode {
                        Tp1Mode::Poc | Tp1Mode::MidVa => sig.take_profit,
                        Tp1Mode::FixedAtr => {
                            sig.entry_price + sig.direction.sign() * tm.tp1_atr * atr
                        }
                    });
                    let tp2 = sig.tp2.unwrap_or(sig.take_profit);

                    debug!(
                        reason = %sig.reason,
                        entry = entry_filled,
                        sl = sig.stop_loss,
                        tp1,
                        tp2,
                        "entry"
                    );
                    position = Some(Position::open(
                        &sig,
                        bar.time,
                        entry_filled,
                        tm.entry_lot,
                        tm.tp1_close_lot,
                        Some(tp1),
                        Some(tp2),
                    ));
                }
            }
        }

        // Close any remainder at the last close
        if let Some(pos) = position.take() {
            if let Some(last) = frame.bars().last() {
                let (pos, update) = pos.close_at(last.time, last.close, &fill);
                balance += update.realized_pnl;
                if let Some(trade) = pos.into_closed() {
                    trades.push(trade);
                }
            }
        }

        let metrics = compute_metrics(self.cfg.account.initial_balance, &trades);
        info!(
            trades = metrics.trades,
            final_balance = metrics.final_balance,
            winrate_pct = metrics.winrate_pct,
            max_drawdown = metrics.max_drawdown,
            "backtest finished"
        );
        Ok(BacktestReport { metrics, trades })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AccountConfig, BePlusMode, DataConfig, FillConfig, RiskConfig, RulesConfig,
        SessionsConfig, SymbolConfig, TradeManagementConfig, VpConfig, WindowConfig,
    };
    use chrono::{TimeZone, Utc};

    fn make_config() -> AppConfig {
        AppConfig {
            symbol: SymbolConfig {
                contract_size: 100.0,
                min_lot: 0.01,
                lot_step: 0.01,
                point_value: 0.01,
            },
            vp: VpConfig {
                bin_size: 0.5,
                value_area_pct: 0.7,
                hvn_top_bins: 10,
                lvn_bottom_bins: 10,
                merge_gap_bins: 2,
            },
            rules: RulesConfig {
                atr_period: 1,
                vol_spike_quantile: 0.75,
                sl_atr_mult_va_trap: 1.2,
                va_reentry_buffer_atr: 0.25,
                sl_atr_mult_second_entry: 1.2,
                tp_atr_mult_second_entry: 1.6,
                second_entry_min_move_atr: 1.0,
                second_entry_pullback_pct: 0.5,
            },
            sessions: SessionsConfig {
                timezone: "UTC".to_string(),
                asia: WindowConfig {
                    start: "00:00".to_string(),
                    end: "09:00".to_string(),
                },
                london: WindowConfig {
                    start: "12:00".to_string(),
                    end: "17:00".to_string(),
                },
            },
            risk: RiskConfig {
                risk_per_trade_pct: 0.5,
                max_consecutive_loss: 3,
            },
            trade_management: TradeManagementConfig {
                entry_lot: 0.04,
                tp1_close_lot: 0.02,
                tp1_mode: Tp1Mode::Poc,
                tp1_atr: 1.0,
                be_plus_mode: BePlusMode::Atr,
                be_plus_atr: 0.1,
                be_plus_points: 0.0,
            },
            fill: FillConfig {
                spread_points: 0.0,
                slippage_points: 0.0,
            },
            account: AccountConfig {
                initial_balance: 10_000.0,
            },
            data: DataConfig {
                bars_m1_csv: String::new(),
                bars_m15_csv: String::new(),
                report_csv: String::new(),
            },
        }
    }

    fn bar_at(h: u32, m: u32, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            time: Utc.with_ymd_and_hms(2025, 1, 6, h, m, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn m1_bars_at(h: u32) -> Vec<Bar> {
        vec![
            bar_at(h, 1, 1000.2, 1000.2, 1000.2, 1000.2, 10.0),
            bar_at(h, 2, 1000.6, 1000.6, 1000.6, 1000.6, 50.0),
            bar_at(h, 3, 1001.1, 1001.1, 1001.1, 1001.1, 5.0),
        ]
    }

    /// Absorption BUY on bar 2, scale-out on the following bars.
    fn winning_day_m15() -> Vec<Bar> {
        vec![
            bar_at(1, 0, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 15, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 30, 1000.2, 1000.5, 999.9, 1000.4, 100.0), // entry
            bar_at(1, 45, 1000.4, 1000.6, 1000.3, 1000.5, 10.0), // TP1
            bar_at(2, 0, 1000.5, 1000.7, 1000.45, 1000.5, 10.0), // TP2
        ]
    }

    #[test]
    fn test_scale_out_trade_closes_at_tp2() {
        let engine = BacktestEngine::new(make_config());
        let report = engine.run(m1_bars_at(0), winning_day_m15()).unwrap();

        assert_eq!(report.trades.len(), 1);
        let t = &report.trades[0];
        assert_eq!(t.exit_reason, "TP2");
        assert_eq!(t.reason, "VP_ASIA_VA_REENTRY_ABSORB_BUY");
        // Entry 1000.4; TP1 and TP2 both at 1000.5, 0.02 lot each
        assert!((t.pnl - 0.4).abs() < 1e-9);
        assert_eq!(report.metrics.trades, 1);
        assert_eq!(report.metrics.wins, 1);
    }

    #[test]
    fn test_open_remainder_closes_at_end_of_data() {
        let mut m15 = winning_day_m15();
        m15.truncate(3); // entry bar is the last bar
        let engine = BacktestEngine::new(make_config());
        let report = engine.run(m1_bars_at(0), m15).unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_reason, "EOD");
        // Closed at the entry bar's close = raw entry price, zero cost
        assert!((report.trades[0].pnl).abs() < 1e-9);
    }

    /// Asia entry stopped out, then a London absorption setup later the same
    /// day. With the loss limit at one, the day gate blocks the second trade.
    fn loss_then_london_m15() -> Vec<Bar> {
        vec![
            bar_at(1, 0, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 15, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 30, 1000.2, 1000.5, 999.9, 1000.4, 100.0), // asia entry
            bar_at(1, 45, 1000.4, 1000.4, 999.0, 999.2, 10.0),   // stop
            bar_at(12, 0, 1000.2, 1000.3, 1000.1, 1000.2, 10.0),
            bar_at(12, 15, 1000.2, 1000.3, 1000.1, 1000.2, 10.0),
            bar_at(12, 30, 1000.2, 1000.5, 999.9, 1000.4, 200.0), // london setup
        ]
    }

    fn both_session_m1() -> Vec<Bar> {
        let mut bars = m1_bars_at(0);
        bars.extend(m1_bars_at(12));
        bars
    }

    #[test]
    fn test_consecutive_loss_blocks_the_day() {
        let mut cfg = make_config();
        cfg.risk.max_consecutive_loss = 1;
        let engine = BacktestEngine::new(cfg);
        let report = engine
            .run(both_session_m1(), loss_then_london_m15())
            .unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_reason, "SL");
        assert!(report.trades[0].pnl < 0.0);
    }

    #[test]
    fn test_london_entry_allowed_under_loss_limit() {
        let engine = BacktestEngine::new(make_config());
        let report = engine
            .run(both_session_m1(), loss_then_london_m15())
            .unwrap();

        assert_eq!(report.trades.len(), 2);
        assert_eq!(report.trades[0].exit_reason, "SL");
        assert_eq!(report.trades[1].reason, "VP_LONDON_VA_REENTRY_ABSORB_BUY");
        assert_eq!(report.trades[1].exit_reason, "EOD");
    }
}
