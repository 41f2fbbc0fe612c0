//! Core types used throughout vpbot
//!
//! Bars, trade direction, signals and closed-trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::SessionId;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for BUY, -1 for SELL; folds both directions into one PnL formula
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// OHLCV bar at a fixed resolution (M1 for profiles, M15 for decisions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time (UTC)
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Tick volume
    pub volume: f64,
}

/// Which pattern produced a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupKind {
    /// Absorption at a value-area edge with a volume spike
    VaAbsorption,
    /// Breakout beyond the value area followed by a failed retest
    VaTrap,
    /// Continuation entry after a pullback to the entry zone
    SecondEntry,
}

impl SetupKind {
    /// One-letter tag used in trade reports
    pub fn tag(&self) -> &'static str {
        match self {
            SetupKind::VaAbsorption | SetupKind::VaTrap => "D",
            SetupKind::SecondEntry => "B",
        }
    }
}

/// Trade proposal emitted by the signal engine
///
/// `take_profit` is the legacy single-target field; `tp1`/`tp2` carry the
/// two-stage scale-out targets when the setup defines them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    /// Risk-sized lot suggestion
    pub lot: f64,
    pub setup: SetupKind,
    pub session: SessionId,
    /// Full setup tag, e.g. "VP_ASIA_VA_REENTRY_TRAP_BUY"
    pub reason: String,
}

/// Fully closed trade, one row per position in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: String,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Original position size
    pub lot: f64,
    /// Realized PnL accumulated across partial and final exits
    pub pnl: f64,
    /// One-letter setup tag
    pub setup: String,
    pub reason: String,
    pub exit_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display_and_sign() {
        assert_eq!(Direction::Buy.to_string(), "BUY");
        assert_eq!(Direction::Sell.to_string(), "SELL");
        assert_eq!(Direction::Buy.sign(), 1.0);
        assert_eq!(Direction::Sell.sign(), -1.0);
    }

    #[test]
    fn test_setup_tags() {
        assert_eq!(SetupKind::VaAbsorption.tag(), "D");
        assert_eq!(SetupKind::VaTrap.tag(), "D");
        assert_eq!(SetupKind::SecondEntry.tag(), "B");
    }
}
