//! Volume-profile signal engine
//!
//! Evaluates one decision bar at a time against the session profile and the
//! pattern rules, holding the per-day state (one trade per session, first
//! Asia entry memo). Matchers run in a fixed order inside each session and
//! the first match wins; every evaluation also returns a structured trace of
//! what was considered and why it was rejected.

mod trace;

pub use trace::{RejectReason, SignalEvaluation, TraceEvent};

use anyhow::Result;
use chrono::NaiveDate;

use crate::config::{AppConfig, RulesConfig, VpConfig};
use crate::indicators;
use crate::profile::{ProfilePack, SessionProfileCache};
use crate::risk::calc_lot_by_risk;
use crate::series::BarFrame;
use crate::session::{SessionId, SessionWindow};
use crate::types::{Direction, SetupKind, Signal};

/// Bars scanned backwards for a prior value-area breakout
const TRAP_LOOKBACK: usize = 10;
/// TP1 distance in ATR when the profile has no POC
const TP1_FALLBACK_ATR: f64 = 1.0;
/// Second entries accept a softer volume spike than first entries
const SECOND_ENTRY_VOL_RELAX: f64 = 0.7;

fn price_in_zone(price: f64, low: f64, high: f64) -> bool {
    low <= price && price <= high
}

/// Stateful per-day signal engine
pub struct VpStrategy {
    vp: VpConfig,
    rules: RulesConfig,
    contract_size: f64,
    min_lot: f64,
    lot_step: f64,
    risk_pct: f64,
    asia_window: SessionWindow,
    london_window: SessionWindow,

    cur_day: Option<NaiveDate>,
    asia_traded: bool,
    london_traded: bool,
    asia_setup_a_triggered: bool,
    asia_first_entry_price: Option<f64>,
}

impl VpStrategy {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            vp: cfg.vp.clone(),
            rules: cfg.rules.clone(),
            contract_size: cfg.symbol.contract_size,
            min_lot: cfg.symbol.min_lot,
            lot_step: cfg.symbol.lot_step,
            risk_pct: cfg.risk.risk_per_trade_pct,
            asia_window: cfg.session_window(SessionId::Asia)?,
            london_window: cfg.session_window(SessionId::London)?,
            cur_day: None,
            asia_traded: false,
            london_traded: false,
            asia_setup_a_triggered: false,
            asia_first_entry_price: None,
        })
    }

    /// Reset the per-day state; called on the first bar of each local day.
    pub fn on_new_day(&mut self, day: NaiveDate) {
        self.cur_day = Some(day);
        self.asia_traded = false;
        self.london_traded = false;
        self.asia_setup_a_triggered = false;
        self.asia_first_entry_price = None;
    }

    /// Evaluate bar `i` of the decision frame.
    ///
    /// At most one signal comes back; the trace always records every matcher
    /// consulted and each rejection's reason.
    pub fn get_signal(
        &mut self,
        i: usize,
        frame: &BarFrame,
        cache: &mut SessionProfileCache,
        balance: f64,
    ) -> SignalEvaluation {
        let mut eval = SignalEvaluation::default();

        let day = frame.local_day(i);
        if self.cur_day != Some(day) {
            self.on_new_day(day);
        }

        let Some(atr) = frame.atr(i) else {
            eval.trace.push(TraceEvent::AtrUnavailable);
            return eval;
        };

        let t = frame.local_time(i).time();
        let mut in_any_session = false;

        if self.asia_window.contains(t) {
            in_any_session = true;
            let window = self.asia_window;
            let pack = cache.get(day, SessionId::Asia, &window);

            if let Some(sig) = self.asia_va_reentry(i, frame, balance, atr, &pack, &mut eval.trace)
            {
                eval.signal = Some(sig);
                return eval;
            }
            if let Some(sig) =
                self.asia_second_entry(i, frame, balance, atr, &pack, &mut eval.trace)
            {
                eval.signal = Some(sig);
                return eval;
            }
        }

        if self.london_window.contains(t) {
            in_any_session = true;
            let window = self.london_window;
            let pack = cache.get(day, SessionId::London, &window);

            if let Some(sig) =
                self.london_va_reentry(i, frame, balance, atr, &pack, &mut eval.trace)
            {
                eval.signal = Some(sig);
                return eval;
            }
        }

        if !in_any_session {
            eval.trace.push(TraceEvent::OutsideSessions);
        }
        eval
    }

    fn asia_va_reentry(
        &mut self,
        i: usize,
        frame: &BarFrame,
        balance: f64,
        atr: f64,
        pack: &ProfilePack,
        trace: &mut Vec<TraceEvent>,
    ) -> Option<Signal> {
        if self.asia_traded {
            trace.push(TraceEvent::SessionLocked(SessionId::Asia));
            return None;
        }
        let sig = self.va_reentry_signal(i, frame, balance, atr, pack, SessionId::Asia, trace)?;

        self.asia_traded = true;
        self.asia_setup_a_triggered = true;
        self.asia_first_entry_price = Some(sig.entry_price);
        Some(sig)
    }

    fn london_va_reentry(
        &mut self,
        i: usize,
        frame: &BarFrame,
        balance: f64,
        atr: f64,
        pack: &ProfilePack,
        trace: &mut Vec<TraceEvent>,
    ) -> Option<Signal> {
        if self.london_traded {
            trace.push(TraceEvent::SessionLocked(SessionId::London));
            return None;
        }
        let sig =
            self.va_reentry_signal(i, frame, balance, atr, pack, SessionId::London, trace)?;

        self.london_traded = true;
        Some(sig)
    }

    /// VA re-entry matcher shared by both sessions.
    ///
    /// Two sub-patterns, checked in order:
    /// - absorption: a volume spike touching a VA edge while the close holds
    ///   inside the value area, candle agreeing with the bounce;
    /// - standard trap: a recent breakout beyond a VA edge whose retest bar
    ///   closes back inside.
    ///
    /// TP1 is the POC, TP2 the opposite VA edge; both fall back to fixed ATR
    /// distances from the entry when the landmark is absent.
    fn va_reentry_signal(
        &self,
        i: usize,
        frame: &BarFrame,
        balance: f64,
        atr: f64,
        pack: &ProfilePack,
        session: SessionId,
        trace: &mut Vec<TraceEvent>,
    ) -> Option<Signal> {
        let Some((val, vah)) = pack.value_area else {
            trace.push(TraceEvent::ProfileUnavailable(session));
            return None;
        };
        let bar = frame.bar(i);

        // Absorption confirm: spike volume relative to the day so far
        let day_vols = frame.day_volumes_through(i);
        let thresh =
            indicators::quantile(&day_vols, self.rules.vol_spike_quantile).unwrap_or(f64::INFINITY);
        let vol_spike = bar.volume >= thresh;

        if vol_spike && val <= bar.close && bar.close <= vah {
            // BUY: edge touch at VAL with a bullish close
            if bar.low <= val && bar.close >= bar.open {
                let entry = bar.close;
                let sl_dist = self.rules.sl_atr_mult_va_trap * atr;
                let tp1 = pack.poc.unwrap_or(entry + TP1_FALLBACK_ATR * atr);
                let tp2 = vah;

                trace.push(TraceEvent::Matched {
                    session,
                    setup: SetupKind::VaAbsorption,
                });
                return Some(self.make_signal(
                    Direction::Buy,
                    entry,
                    entry - sl_dist,
                    sl_dist,
                    tp1,
                    tp2,
                    balance,
                    SetupKind::VaAbsorption,
                    session,
                    format!("VP_{}_VA_REENTRY_ABSORB_BUY", session.tag()),
                ));
            }
            // SELL: edge touch at VAH with a bearish close
            if bar.high >= vah && bar.close <= bar.open {
                let entry = bar.close;
                let sl_dist = self.rules.sl_atr_mult_va_trap * atr;
                let tp1 = pack.poc.unwrap_or(entry - TP1_FALLBACK_ATR * atr);
                let tp2 = val;

                trace.push(TraceEvent::Matched {
                    session,
                    setup: SetupKind::VaAbsorption,
                });
                return Some(self.make_signal(
                    Direction::Sell,
                    entry,
                    entry + sl_dist,
                    sl_dist,
                    tp1,
                    tp2,
                    balance,
                    SetupKind::VaAbsorption,
                    session,
                    format!("VP_{}_VA_REENTRY_ABSORB_SELL", session.tag()),
                ));
            }
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::VaAbsorption,
                reason: RejectReason::NoPattern,
            });
        } else {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::VaAbsorption,
                reason: if vol_spike {
                    RejectReason::PriceOutsideZone
                } else {
                    RejectReason::VolumeBelowThreshold
                },
            });
        }

        // Standard trap needs enough history for the breakout scan
        if i < 5 {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::VaTrap,
                reason: RejectReason::InsufficientHistory,
            });
            return None;
        }

        let buffer = self.rules.va_reentry_buffer_atr * atr;
        let start = i.saturating_sub(TRAP_LOOKBACK);
        let prior = &frame.bars()[start..i];

        let breakout_up = prior.iter().any(|b| b.high > vah + buffer);
        let breakout_down = prior.iter().any(|b| b.low < val - buffer);

        // SELL trap: failed breakout above, retest from above closing back in
        if breakout_up && bar.high >= vah - buffer && bar.close < vah {
            let entry = bar.close.min(vah);
            let sl_dist = self.rules.sl_atr_mult_va_trap * atr;
            let tp1 = pack.poc.unwrap_or(entry - TP1_FALLBACK_ATR * atr);
            let tp2 = val;

            trace.push(TraceEvent::Matched {
                session,
                setup: SetupKind::VaTrap,
            });
            return Some(self.make_signal(
                Direction::Sell,
                entry,
                entry + sl_dist,
                sl_dist,
                tp1,
                tp2,
                balance,
                SetupKind::VaTrap,
                session,
                format!("VP_{}_VA_REENTRY_TRAP_SELL", session.tag()),
            ));
        }

        // BUY trap: failed breakdown below, retest from below closing back in
        if breakout_down && bar.low <= val + buffer && bar.close > val {
            let entry = bar.close.max(val);
            let sl_dist = self.rules.sl_atr_mult_va_trap * atr;
            let tp1 = pack.poc.unwrap_or(entry + TP1_FALLBACK_ATR * atr);
            let tp2 = vah;

            trace.push(TraceEvent::Matched {
                session,
                setup: SetupKind::VaTrap,
            });
            return Some(self.make_signal(
                Direction::Buy,
                entry,
                entry - sl_dist,
                sl_dist,
                tp1,
                tp2,
                balance,
                SetupKind::VaTrap,
                session,
                format!("VP_{}_VA_REENTRY_TRAP_BUY", session.tag()),
            ));
        }

        trace.push(TraceEvent::Rejected {
            session,
            setup: SetupKind::VaTrap,
            reason: RejectReason::NoPattern,
        });
        None
    }

    /// Continuation entry after the first Asia trade: a pullback into the
    /// VAL zone on confirming volume. The session lock is re-checked after
    /// the pattern confirms, keeping the matcher's full trace available even
    /// on locked days.
    fn asia_second_entry(
        &mut self,
        i: usize,
        frame: &BarFrame,
        balance: f64,
        atr: f64,
        pack: &ProfilePack,
        trace: &mut Vec<TraceEvent>,
    ) -> Option<Signal> {
        let session = SessionId::Asia;
        if !self.asia_setup_a_triggered {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::NoPriorEntry,
            });
            return None;
        }
        let Some(first_entry) = self.asia_first_entry_price else {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::NoPriorEntry,
            });
            return None;
        };

        let bar = frame.bar(i);

        // Decision zone: a band above VAL, or the lowest HVN when VA is absent
        let (target_low, target_high) = match pack.val() {
            Some(val) => (val, val + self.vp.bin_size * 2.0),
            None => {
                let lowest = pack
                    .hvn
                    .iter()
                    .min_by(|a, b| a.low.partial_cmp(&b.low).unwrap_or(std::cmp::Ordering::Equal));
                match lowest {
                    Some(z) => (z.low, z.high),
                    None => {
                        trace.push(TraceEvent::ProfileUnavailable(session));
                        return None;
                    }
                }
            }
        };

        if !price_in_zone(bar.low, target_low, target_high)
            && !price_in_zone(bar.close, target_low, target_high)
        {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::PriceOutsideZone,
            });
            return None;
        }

        // The first leg must have travelled far enough before the pullback
        let move_from_first = bar.close - first_entry;
        let min_move = self.rules.second_entry_min_move_atr * atr;
        if move_from_first < min_move {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::MoveTooSmall,
            });
            return None;
        }

        // Pullback depth measured against the first entry
        let max_pullback = move_from_first * self.rules.second_entry_pullback_pct;
        let current_pullback = bar.close - first_entry;
        if current_pullback > -max_pullback {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::PullbackInsufficient,
            });
            return None;
        }

        let day_vols = frame.day_volumes_through(i);
        let thresh =
            indicators::quantile(&day_vols, self.rules.vol_spike_quantile).unwrap_or(f64::INFINITY);
        if bar.volume < thresh * SECOND_ENTRY_VOL_RELAX {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::VolumeBelowThreshold,
            });
            return None;
        }

        if bar.close < bar.open {
            trace.push(TraceEvent::Rejected {
                session,
                setup: SetupKind::SecondEntry,
                reason: RejectReason::BearishClose,
            });
            return None;
        }

        let sl_dist = self.rules.sl_atr_mult_second_entry * atr;
        let tp_dist = self.rules.tp_atr_mult_second_entry * atr;
        let entry = bar.close;

        // Late lock check: only enter when the session is still open
        if self.asia_traded {
            trace.push(TraceEvent::SessionLocked(session));
            return None;
        }
        self.asia_traded = true;

        trace.push(TraceEvent::Matched {
            session,
            setup: SetupKind::SecondEntry,
        });
        Some(self.make_signal(
            Direction::Buy,
            entry,
            entry - sl_dist,
            sl_dist,
            entry + tp_dist,
            entry + tp_dist,
            balance,
            SetupKind::SecondEntry,
            session,
            "VP_ASIA_SECOND_ENTRY_BUY".to_string(),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn make_signal(
        &self,
        direction: Direction,
        entry: f64,
        stop_loss: f64,
        sl_dist: f64,
        tp1: f64,
        tp2: f64,
        balance: f64,
        setup: SetupKind,
        session: SessionId,
        reason: String,
    ) -> Signal {
        let lot = calc_lot_by_risk(
            balance,
            self.risk_pct,
            sl_dist,
            self.contract_size,
            self.min_lot,
            self.lot_step,
        );
        Signal {
            direction,
            entry_price: entry,
            stop_loss,
            take_profit: tp2,
            tp1: Some(tp1),
            tp2: Some(tp2),
            lot,
            setup,
            session,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AccountConfig, BePlusMode, DataConfig, FillConfig, RiskConfig, SessionsConfig,
        SymbolConfig, Tp1Mode, TradeManagementConfig, WindowConfig,
    };
    use crate::types::Bar;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

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

    /// Minute bars producing bins {1000.0: 10, 1000.5: 50, 1001.0: 5}:
    /// POC 1000.5, value area (1000.0, 1000.5).
    fn profile_m1_bars() -> Vec<Bar> {
        vec![
            bar_at(0, 1, 1000.2, 1000.2, 1000.2, 1000.2, 10.0),
            bar_at(0, 2, 1000.6, 1000.6, 1000.6, 1000.6, 50.0),
            bar_at(0, 3, 1001.1, 1001.1, 1001.1, 1001.1, 5.0),
        ]
    }

    fn setup(
        m15: Vec<Bar>,
    ) -> (VpStrategy, BarFrame, SessionProfileCache) {
        let cfg = make_config();
        let tz: Tz = "UTC".parse().unwrap();
        let strategy = VpStrategy::new(&cfg).unwrap();
        let frame = BarFrame::new(m15, tz, cfg.rules.atr_period);
        let cache = SessionProfileCache::new(profile_m1_bars(), tz, cfg.vp.clone());
        (strategy, frame, cache)
    }

    #[test]
    fn test_absorption_buy_at_val() {
        // Spike bar touching VAL with a bullish close inside the VA
        let m15 = vec![
            bar_at(1, 0, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 15, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 30, 1000.2, 1000.5, 999.9, 1000.4, 100.0),
        ];
        let (mut strategy, frame, mut cache) = setup(m15);

        let eval = strategy.get_signal(2, &frame, &mut cache, 10_000.0);
        let sig = eval.signal.expect("absorption must fire");
        assert_eq!(sig.direction, Direction::Buy);
        assert_eq!(sig.entry_price, 1000.4);
        assert_eq!(sig.tp1, Some(1000.5)); // POC
        assert_eq!(sig.tp2, Some(1000.5)); // VAH
        assert_eq!(sig.setup, SetupKind::VaAbsorption);
        assert_eq!(sig.reason, "VP_ASIA_VA_REENTRY_ABSORB_BUY");
        assert!(eval.trace.contains(&TraceEvent::Matched {
            session: SessionId::Asia,
            setup: SetupKind::VaAbsorption,
        }));

        // The session locks for the rest of the day
        let eval2 = strategy.get_signal(2, &frame, &mut cache, 10_000.0);
        assert!(eval2.signal.is_none());
        assert!(eval2
            .trace
            .contains(&TraceEvent::SessionLocked(SessionId::Asia)));
    }

    #[test]
    fn test_trap_sell_after_breakout_up() {
        // Quiet bars, a breakout above VAH, then a retest closing back inside.
        // Low current volume keeps the absorption branch out of the way.
        let mut m15: Vec<Bar> = (0..5u32)
            .map(|k| bar_at(1 + k / 4, (k % 4) * 15, 1000.3, 1000.4, 1000.2, 1000.3, 50.0))
            .collect();
        m15.push(bar_at(3, 0, 1000.4, 1001.5, 1000.3, 1000.4, 60.0)); // breakout
        m15.push(bar_at(3, 15, 1000.4, 1000.45, 1000.25, 1000.3, 5.0)); // retest
        let (mut strategy, frame, mut cache) = setup(m15);

        let eval = strategy.get_signal(6, &frame, &mut cache, 10_000.0);
        let sig = eval.signal.expect("trap must fire");
        assert_eq!(sig.direction, Direction::Sell);
        assert_eq!(sig.entry_price, 1000.3); // min(close, vah)
        assert_eq!(sig.tp1, Some(1000.5)); // POC
        assert_eq!(sig.tp2, Some(1000.0)); // VAL
        assert_eq!(sig.setup, SetupKind::VaTrap);
        assert_eq!(sig.reason, "VP_ASIA_VA_REENTRY_TRAP_SELL");
        assert_eq!(sig.take_profit, 1000.0);
    }

    #[test]
    fn test_trap_needs_history() {
        let m15 = vec![
            bar_at(1, 0, 1000.3, 1001.5, 1000.2, 1000.3, 10.0),
            bar_at(1, 15, 1000.5, 1000.45, 1000.25, 1000.3, 5.0),
        ];
        let (mut strategy, frame, mut cache) = setup(m15);

        let eval = strategy.get_signal(1, &frame, &mut cache, 10_000.0);
        assert!(eval.signal.is_none());
        assert!(eval.rejected_for(RejectReason::InsufficientHistory));
    }

    #[test]
    fn test_outside_sessions() {
        let m15 = vec![bar_at(10, 0, 1000.3, 1000.4, 1000.2, 1000.3, 10.0)];
        let (mut strategy, frame, mut cache) = setup(m15);

        let eval = strategy.get_signal(0, &frame, &mut cache, 10_000.0);
        assert!(eval.signal.is_none());
        assert_eq!(eval.trace, vec![TraceEvent::OutsideSessions]);
    }

    #[test]
    fn test_atr_warmup_blocks_decisions() {
        let mut cfg = make_config();
        cfg.rules.atr_period = 14;
        let tz: Tz = "UTC".parse().unwrap();
        let mut strategy = VpStrategy::new(&cfg).unwrap();
        let m15 = vec![bar_at(1, 0, 1000.2, 1000.5, 999.9, 1000.4, 100.0)];
        let frame = BarFrame::new(m15, tz, cfg.rules.atr_period);
        let mut cache = SessionProfileCache::new(profile_m1_bars(), tz, cfg.vp.clone());

        let eval = strategy.get_signal(0, &frame, &mut cache, 10_000.0);
        assert!(eval.signal.is_none());
        assert_eq!(eval.trace, vec![TraceEvent::AtrUnavailable]);
    }

    #[test]
    fn test_new_day_resets_session_locks() {
        let m15 = vec![
            bar_at(1, 0, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 15, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(1, 30, 1000.2, 1000.5, 999.9, 1000.4, 100.0),
        ];
        let (mut strategy, frame, mut cache) = setup(m15);
        assert!(strategy
            .get_signal(2, &frame, &mut cache, 10_000.0)
            .signal
            .is_some());
        assert!(strategy.asia_traded);

        strategy.on_new_day(chrono::NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
        assert!(!strategy.asia_traded);
        assert!(!strategy.asia_setup_a_triggered);
        assert_eq!(strategy.asia_first_entry_price, None);
    }

    #[test]
    fn test_london_uses_its_own_lock() {
        // Absorption-shaped bar in the London window
        let m15 = vec![
            bar_at(12, 0, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(12, 15, 1000.3, 1000.4, 1000.2, 1000.3, 10.0),
            bar_at(12, 30, 1000.2, 1000.5, 999.9, 1000.4, 100.0),
        ];
        let (mut strategy, frame, _) = setup(m15);
        // Profile minute bars must fall inside the London window
        let cfg = make_config();
        let tz: Tz = "UTC".parse().unwrap();
        let london_m1: Vec<Bar> = profile_m1_bars()
            .into_iter()
            .map(|mut b| {
                b.time += chrono::Duration::hours(12);
                b
            })
            .collect();
        let mut cache = SessionProfileCache::new(london_m1, tz, cfg.vp.clone());

        let eval = strategy.get_signal(2, &frame, &mut cache, 10_000.0);
        let sig = eval.signal.expect("london absorption must fire");
        assert_eq!(sig.session, SessionId::London);
        assert_eq!(sig.reason, "VP_LONDON_VA_REENTRY_ABSORB_BUY");
        assert!(strategy.london_traded);
        assert!(!strategy.asia_traded);
    }
}
