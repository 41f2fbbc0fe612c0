//! Volume profile builder
//!
//! Bins traded volume by price over one session's minute bars and derives the
//! statistical landmarks (POC, value area). Each bar's volume is attributed
//! entirely to the bin containing its close price.

use std::collections::BTreeMap;

use crate::types::Bar;

/// Histogram of traded volume keyed by discretized price.
///
/// Bins are indexed by `floor(price / bin_size)`; the bin price is the low
/// edge of the interval. Bins are only added, never split.
#[derive(Debug, Clone)]
pub struct VolumeProfile {
    bin_size: f64,
    bins: BTreeMap<i64, f64>,
}

impl VolumeProfile {
    /// Build a profile over a session slice of minute bars.
    ///
    /// An empty slice yields an empty profile: no bins, no landmarks.
    pub fn from_bars<'a, I>(bars: I, bin_size: f64) -> Self
    where
        I: IntoIterator<Item = &'a Bar>,
    {
        let mut bins: BTreeMap<i64, f64> = BTreeMap::new();
        for bar in bars {
            let idx = Self::bin_index(bar.close, bin_size);
            *bins.entry(idx).or_insert(0.0) += bar.volume;
        }
        Self { bin_size, bins }
    }

    fn bin_index(price: f64, bin_size: f64) -> i64 {
        (price / bin_size).floor() as i64
    }

    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }

    fn bin_price(&self, idx: i64) -> f64 {
        idx as f64 * self.bin_size
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn total_volume(&self) -> f64 {
        self.bins.values().sum()
    }

    /// Accumulated volume at the bin containing `price`
    pub fn volume_at(&self, price: f64) -> f64 {
        self.bins
            .get(&Self::bin_index(price, self.bin_size))
            .copied()
            .unwrap_or(0.0)
    }

    /// `(bin_price, volume)` pairs in ascending price order
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins.iter().map(|(&idx, &vol)| (self.bin_price(idx), vol))
    }

    /// `(bin_index, volume)` pairs in ascending price order
    pub(crate) fn indexed_bins(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.bins.iter().map(|(&idx, &vol)| (idx, vol))
    }

    pub(crate) fn price_of_index(&self, idx: i64) -> f64 {
        self.bin_price(idx)
    }

    /// Point of control: the bin price with maximum volume.
    ///
    /// Ties resolve to the first bin in ascending price order.
    pub fn poc(&self) -> Option<f64> {
        let mut best: Option<(i64, f64)> = None;
        for (idx, vol) in self.indexed_bins() {
            match best {
                Some((_, best_vol)) if vol <= best_vol => {}
                _ => best = Some((idx, vol)),
            }
        }
        best.map(|(idx, _)| self.bin_price(idx))
    }

    /// Value area `(val, vah)` covering at least `pct` of total volume.
    ///
    /// Expands from the POC bin, each step taking the larger of the two
    /// frontier bins in the bin list (ties favor the higher price). The
    /// target check runs after each expansion, so the area always grows by
    /// at least one bin when a neighbor exists.
    pub fn value_area(&self, pct: f64) -> Option<(f64, f64)> {
        if self.bins.is_empty() {
            return None;
        }

        let entries: Vec<(i64, f64)> = self.indexed_bins().collect();
        let total: f64 = entries.iter().map(|(_, v)| v).sum();
        let target = total * pct;

        let mut poc_pos = 0;
        for (pos, (_, vol)) in entries.iter().enumerate() {
            if *vol > entries[poc_pos].1 {
                poc_pos = pos;
            }
        }

        let mut lo = poc_pos;
        let mut hi = poc_pos;
        let mut acc = entries[poc_pos].1;

        loop {
            let left = lo.checked_sub(1).map(|p| entries[p].1);
            let right = entries.get(hi + 1).map(|e| e.1);
            match (left, right) {
                (None, None) => break,
                (Some(lv), Some(rv)) if rv >= lv => {
                    hi += 1;
                    acc += rv;
                }
                (Some(lv), _) => {
                    lo -= 1;
                    acc += lv;
                }
                (None, Some(rv)) => {
                    hi += 1;
                    acc += rv;
                }
            }
            if acc >= target {
                break;
            }
        }

        Some((self.bin_price(entries[lo].0), self.bin_price(entries[hi].0)))
    }
}
