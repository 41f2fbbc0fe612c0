//! vpbot - session volume-profile trading engine
//!
//! Builds per-session volume profiles over minute bars, matches re-entry and
//! continuation setups on a decision timeframe, and manages two-stage
//! scale-out positions through a simulated or live execution layer.

pub mod backtest;
pub mod config;
pub mod execution;
pub mod indicators;
pub mod profile;
pub mod reporting;
pub mod risk;
pub mod series;
pub mod session;
pub mod strategy;
pub mod types;
