//! Spread/slippage fill model
//!
//! Conservative quoting: entries and exits each pay half the spread plus
//! one-way slippage, always against the trader.

use crate::config::{FillConfig, SymbolConfig};
use crate::types::Direction;

#[derive(Debug, Clone)]
pub struct FillModel {
    spread_points: f64,
    slippage_points: f64,
    point_value: f64,
    contract_size: f64,
}

impl FillModel {
    pub fn new(fill: &FillConfig, symbol: &SymbolConfig) -> Self {
        Self {
            spread_points: fill.spread_points,
            slippage_points: fill.slippage_points,
            point_value: symbol.point_value,
            contract_size: symbol.contract_size,
        }
    }

    fn cost(&self) -> f64 {
        (self.spread_points / 2.0 + self.slippage_points) * self.point_value
    }

    /// Filled entry price: BUY pays the ask, SELL receives the bid.
    pub fn entry_fill(&self, direction: Direction, price: f64) -> f64 {
        price + direction.sign() * self.cost()
    }

    /// Filled exit price, the mirror of the entry side.
    pub fn exit_fill(&self, direction: Direction, price: f64) -> f64 {
        price - direction.sign() * self.cost()
    }

    /// Realized PnL in account currency for a closed portion
    pub fn pnl(&self, direction: Direction, entry: f64, exit: f64, lot: f64) -> f64 {
        (exit - entry) * direction.sign() * lot * self.contract_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fill(spread: f64, slippage: f64) -> FillModel {
        FillModel {
            spread_points: spread,
            slippage_points: slippage,
            point_value: 0.01,
            contract_size: 100.0,
        }
    }

    #[test]
    fn test_buy_pays_ask_sells_bid() {
        let fill = make_fill(30.0, 0.0);
        // Half spread = 15 points = 0.15
        assert!((fill.entry_fill(Direction::Buy, 2000.0) - 2000.15).abs() < 1e-12);
        assert!((fill.exit_fill(Direction::Buy, 2000.0) - 1999.85).abs() < 1e-12);
        assert!((fill.entry_fill(Direction::Sell, 2000.0) - 1999.85).abs() < 1e-12);
        assert!((fill.exit_fill(Direction::Sell, 2000.0) - 2000.15).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_costs_full_spread() {
        let fill = make_fill(30.0, 5.0);
        for direction in [Direction::Buy, Direction::Sell] {
            let entry = fill.entry_fill(direction, 2000.0);
            let exit = fill.exit_fill(direction, 2000.0);
            // Flat market round trip loses spread + 2x slippage
            let pnl = fill.pnl(direction, entry, exit, 1.0);
            assert!((pnl - (-40.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pnl_signs() {
        let fill = make_fill(0.0, 0.0);
        assert_eq!(fill.pnl(Direction::Buy, 2000.0, 2010.0, 0.1), 100.0);
        assert_eq!(fill.pnl(Direction::Sell, 2000.0, 2010.0, 0.1), -100.0);
        assert_eq!(fill.pnl(Direction::Sell, 2000.0, 1990.0, 0.1), 100.0);
    }
}
