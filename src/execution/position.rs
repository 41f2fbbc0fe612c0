//! Open position lifecycle
//!
//! A position first *plans* an exit against a bar or tick (`check_bar`,
//! `check_tick`), then *applies* it (`apply_exit`), consuming the old value
//! and returning the new one. The split keeps planning side-effect free so a
//! live manager can confirm the order with its broker before any state moves.
//!
//! Exit priority within one bar is SL, then TP1, then TP2; when the stop and
//! a target share a bar the stop wins (conservative).

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::config::{BePlusMode, TradeManagementConfig};
use crate::types::{ClosedTrade, Direction, SetupKind, Signal};

use super::fill::FillModel;

/// Terminal or partial exit recorded on a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitEvent {
    StopLoss,
    /// TP1 closed part of the position; a runner remains
    Tp1Partial,
    /// TP1 closed the whole position
    Tp1Full,
    Tp2,
    EndOfData,
}

impl fmt::Display for ExitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitEvent::StopLoss => "SL",
            ExitEvent::Tp1Partial => "TP1_PARTIAL",
            ExitEvent::Tp1Full => "TP1_FULL",
            ExitEvent::Tp2 => "TP2",
            ExitEvent::EndOfData => "EOD",
        };
        write!(f, "{s}")
    }
}

/// Which exit level a planned exit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    StopLoss,
    TakeProfit1,
    TakeProfit2,
}

/// Planned exit: what to close, how much, and at what filled price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitIntent {
    pub kind: ExitKind,
    pub lot: f64,
    pub fill_price: f64,
}

/// Result of applying one exit intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeUpdate {
    pub realized_pnl: f64,
    pub closed_all: bool,
    pub event: ExitEvent,
}

/// One open trade with two-stage scale-out state
#[derive(Debug, Clone)]
pub struct Position {
    pub id: String,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    /// Filled entry price (spread already paid)
    pub entry_price: f64,
    pub stop_loss: f64,
    /// Legacy single-target field, mirrors TP2
    pub take_profit: f64,
    /// Original size at entry
    pub lot: f64,
    /// Still-open size
    pub lot_open: f64,
    /// Size to close at TP1
    pub lot_tp1: f64,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub tp1_hit: bool,
    /// Stop after the BE+ move, for reporting
    pub sl_after_tp1: Option<f64>,
    /// PnL realized so far across partial exits
    pub realized_pnl: f64,
    pub setup: SetupKind,
    pub reason: String,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    pub exit_event: Option<ExitEvent>,
}

impl Position {
    /// Open a position from a signal at an already-filled entry price.
    pub fn open(
        signal: &Signal,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        entry_lot: f64,
        lot_tp1: f64,
        tp1: Option<f64>,
        tp2: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            direction: signal.direction,
            entry_time,
            entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            lot: entry_lot,
            lot_open: entry_lot,
            lot_tp1,
            tp1,
            tp2,
            tp1_hit: false,
            sl_after_tp1: None,
            realized_pnl: 0.0,
            setup: signal.setup,
            reason: signal.reason.clone(),
            exit_time: None,
            exit_price: None,
            exit_event: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lot_open <= 0.0
    }

    fn hit_sl(&self, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Buy => low <= self.stop_loss,
            Direction::Sell => high >= self.stop_loss,
        }
    }

    fn hit_tp(&self, high: f64, low: f64, tp: f64) -> bool {
        match self.direction {
            Direction::Buy => high >= tp,
            Direction::Sell => low <= tp,
        }
    }

    /// Plan the exit a bar would trigger, if any. Exit prices are filled
    /// through the spread model at the triggered level.
    pub fn check_bar(&self, high: f64, low: f64, fill: &FillModel) -> Option<ExitIntent> {
        if self.is_closed() {
            return None;
        }

        if self.hit_sl(high, low) {
            return Some(ExitIntent {
                kind: ExitKind::StopLoss,
                lot: self.lot_open,
                fill_price: fill.exit_fill(self.direction, self.stop_loss),
            });
        }

        if !self.tp1_hit {
            if let Some(tp1) = self.tp1 {
                if self.hit_tp(high, low, tp1) {
                    return Some(ExitIntent {
                        kind: ExitKind::TakeProfit1,
                        lot: self.lot_tp1,
                        fill_price: fill.exit_fill(self.direction, tp1),
                    });
                }
            }
        }

        if let Some(tp2) = self.tp2 {
            if self.hit_tp(high, low, tp2) {
                return Some(ExitIntent {
                    kind: ExitKind::TakeProfit2,
                    lot: self.lot_open,
                    fill_price: fill.exit_fill(self.direction, tp2),
                });
            }
        }

        None
    }

    /// Plan the exit a tick would trigger. A BUY exits on the bid, a SELL on
    /// the ask, and the quote itself is the fill price.
    pub fn check_tick(&self, bid: f64, ask: f64) -> Option<ExitIntent> {
        if self.is_closed() {
            return None;
        }
        let check_price = match self.direction {
            Direction::Buy => bid,
            Direction::Sell => ask,
        };

        let sl_hit = match self.direction {
            Direction::Buy => check_price <= self.stop_loss,
            Direction::Sell => check_price >= self.stop_loss,
        };
        if sl_hit {
            return Some(ExitIntent {
                kind: ExitKind::StopLoss,
                lot: self.lot_open,
                fill_price: check_price,
            });
        }

        let beyond = |tp: f64| match self.direction {
            Direction::Buy => check_price >= tp,
            Direction::Sell => check_price <= tp,
        };

        if !self.tp1_hit {
            if let Some(tp1) = self.tp1 {
                if beyond(tp1) {
                    return Some(ExitIntent {
                        kind: ExitKind::TakeProfit1,
                        lot: self.lot_tp1,
                        fill_price: check_price,
                    });
                }
            }
        }

        if let Some(tp2) = self.tp2 {
            if beyond(tp2) {
                return Some(ExitIntent {
                    kind: ExitKind::TakeProfit2,
                    lot: self.lot_open,
                    fill_price: check_price,
                });
            }
        }

        None
    }

    /// Apply a planned exit, consuming the position.
    ///
    /// TP1 latches, closes its lot and moves the stop to breakeven-plus; SL
    /// and TP2 close the remainder. `atr` feeds the BE+ buffer in ATR mode.
    pub fn apply_exit(
        mut self,
        intent: ExitIntent,
        atr: f64,
        cfg_tm: &TradeManagementConfig,
        fill: &FillModel,
        time: DateTime<Utc>,
    ) -> (Position, TradeUpdate) {
        let realized = fill.pnl(self.direction, self.entry_price, intent.fill_price, intent.lot);
        self.realized_pnl += realized;

        let event = match intent.kind {
            ExitKind::StopLoss => {
                self.lot_open = 0.0;
                ExitEvent::StopLoss
            }
            ExitKind::TakeProfit1 => {
                self.tp1_hit = true;
                self.lot_open = (self.lot_open - intent.lot).max(0.0);

                let buf = match cfg_tm.be_plus_mode {
                    BePlusMode::Atr => cfg_tm.be_plus_atr * atr,
                    BePlusMode::Points => cfg_tm.be_plus_points,
                };
                self.stop_loss = self.entry_price + self.direction.sign() * buf;
                self.sl_after_tp1 = Some(self.stop_loss);

                if self.lot_open <= 0.0 {
                    ExitEvent::Tp1Full
                } else {
                    ExitEvent::Tp1Partial
                }
            }
            ExitKind::TakeProfit2 => {
                self.lot_open = 0.0;
                ExitEvent::Tp2
            }
        };

        let closed_all = self.is_closed();
        if closed_all {
            self.exit_time = Some(time);
            self.exit_price = Some(intent.fill_price);
            self.exit_event = Some(event);
        }

        (
            self,
            TradeUpdate {
                realized_pnl: realized,
                closed_all,
                event,
            },
        )
    }

    /// Force-close the remainder at a raw price (end of data).
    pub fn close_at(
        self,
        time: DateTime<Utc>,
        raw_price: f64,
        fill: &FillModel,
    ) -> (Position, TradeUpdate) {
        let fill_price = fill.exit_fill(self.direction, raw_price);
        let lot = self.lot_open;

        let mut pos = self;
        let realized = fill.pnl(pos.direction, pos.entry_price, fill_price, lot);
        pos.realized_pnl += realized;
        pos.lot_open = 0.0;
        pos.exit_time = Some(time);
        pos.exit_price = Some(fill_price);
        pos.exit_event = Some(ExitEvent::EndOfData);

        (
            pos,
            TradeUpdate {
                realized_pnl: realized,
                closed_all: true,
                event: ExitEvent::EndOfData,
            },
        )
    }

    /// Convert a fully closed position into its report row.
    pub fn into_closed(self) -> Option<ClosedTrade> {
        let exit_time = self.exit_time?;
        let exit_price = self.exit_price?;
        let exit_event = self.exit_event?;
        Some(ClosedTrade {
            id: self.id,
            direction: self.direction,
            entry_time: self.entry_time,
            exit_time,
            entry_price: self.entry_price,
            exit_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            lot: self.lot,
            pnl: self.realized_pnl,
            setup: self.setup.tag().to_string(),
            reason: self.reason,
            exit_reason: exit_event.to_string(),
        })
    }
}
