//! Decision frame: bars plus the derived columns the signal engine indexes
//!
//! Mirrors the driver's prepared dataframe: each M15 bar carries its ATR and
//! its session-local timestamp, so strategies index one structure by bar
//! position.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::indicators;
use crate::types::Bar;

/// Time-ordered bar series with precomputed ATR and local timestamps
pub struct BarFrame {
    bars: Vec<Bar>,
    atr: Vec<Option<f64>>,
    local: Vec<DateTime<Tz>>,
}

impl BarFrame {
    /// Build a frame from time-ordered bars.
    ///
    /// ATR is `None` for the warm-up prefix; callers skip decisions there.
    pub fn new(bars: Vec<Bar>, tz: Tz, atr_period: usize) -> Self {
        let atr = indicators::atr(&bars, atr_period);
        let local = bars.iter().map(|b| b.time.with_timezone(&tz)).collect();
        Self { bars, atr, local }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar(&self, i: usize) -> &Bar {
        &self.bars[i]
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn atr(&self, i: usize) -> Option<f64> {
        self.atr[i]
    }

    pub fn local_time(&self, i: usize) -> DateTime<Tz> {
        self.local[i]
    }

    pub fn local_day(&self, i: usize) -> NaiveDate {
        self.local[i].date_naive()
    }

    /// Volumes of every bar sharing bar `i`'s local day, up to and including
    /// `i`. Same-day bars are contiguous in a time-ordered series, so this
    /// scans backwards until the day changes.
    pub fn day_volumes_through(&self, i: usize) -> Vec<f64> {
        let day = self.local_day(i);
        let mut start = i;
        while start > 0 && self.local_day(start - 1) == day {
            start -= 1;
        }
        self.bars[start..=i].iter().map(|b| b.volume).collect()
    }
}
