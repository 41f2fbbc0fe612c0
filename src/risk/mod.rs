//! Risk-based position sizing

/// Floor `x` to the nearest multiple of `step`
pub fn round_to_step(x: f64, step: f64) -> f64 {
    (x / step).floor() * step
}

/// Lot size risking `risk_pct` percent of balance over a stop distance.
///
/// PnL per unit price move is `lot * contract_size`, so
/// `lot = risk_usd / (sl_distance * contract_size)`, floored to the broker's
/// lot step and clamped to the minimum lot. The stop distance is bounded away
/// from zero so a degenerate stop cannot produce an unbounded lot.
pub fn calc_lot_by_risk(
    balance: f64,
    risk_pct: f64,
    sl_distance: f64,
    contract_size: f64,
    min_lot: f64,
    lot_step: f64,
) -> f64 {
    let risk_usd = balance * (risk_pct / 100.0);
    let raw = risk_usd / (sl_distance.max(1e-9) * contract_size);
    min_lot.max(round_to_step(raw, lot_step))
}
