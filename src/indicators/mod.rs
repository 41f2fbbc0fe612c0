//! Indicator helpers for the decision frame
//!
//! Only what the signal engine needs: a rolling-mean ATR over true range and
//! the linear-interpolation quantile used by the volume-spike filter. This is
//! deliberately not a general indicator library.

use crate::types::Bar;

/// True range of a bar given the previous close
fn true_range(prev_close: Option<f64>, bar: &Bar) -> f64 {
    let hl = bar.high - bar.low;
    match prev_close {
        Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
        None => hl,
    }
}

/// ATR as a simple rolling mean of true range.
///
/// Returns one entry per bar; the first `period - 1` entries are `None`
/// (warm-up), mirroring a rolling window that is dropped before trading.
pub fn atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    assert!(period > 0, "atr period must be positive");

    let mut tr = Vec::with_capacity(bars.len());
    let mut prev_close = None;
    for bar in bars {
        tr.push(true_range(prev_close, bar));
        prev_close = Some(bar.close);
    }

    let mut out = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;
    for i in 0..tr.len() {
        window_sum += tr[i];
        if i >= period {
            window_sum -= tr[i - period];
        }
        if i + 1 >= period {
            out.push(Some(window_sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`; returns `None` on an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
