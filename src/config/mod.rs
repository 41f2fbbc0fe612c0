//! Configuration management for vpbot
//!
//! Loads from optional TOML/YAML files + environment variables via .env.
//! The core assumes a validated config: bad values are fatal here, never
//! re-checked inside the decision code.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::session::{SessionId, SessionWindow};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub symbol: SymbolConfig,
    pub vp: VpConfig,
    pub rules: RulesConfig,
    pub sessions: SessionsConfig,
    pub risk: RiskConfig,
    pub trade_management: TradeManagementConfig,
    pub fill: FillConfig,
    pub account: AccountConfig,
    pub data: DataConfig,
}

/// Instrument contract specs (XAUUSD-style defaults)
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    /// Contract size per 1.0 lot
    pub contract_size: f64,
    /// Broker minimum lot
    pub min_lot: f64,
    /// Lot increment
    pub lot_step: f64,
    /// Price value of one point (0.01 for a 2-decimal instrument)
    pub point_value: f64,
}

/// Volume profile parameters
#[derive(Debug, Clone, Deserialize)]
pub struct VpConfig {
    /// Price bin width
    pub bin_size: f64,
    /// Fraction of session volume the value area must cover
    pub value_area_pct: f64,
    /// HVN candidates: top-N bins by volume
    pub hvn_top_bins: usize,
    /// LVN candidates: bottom-N bins by volume
    pub lvn_bottom_bins: usize,
    /// Max gap (in bins) merged into one zone
    pub merge_gap_bins: i64,
}

/// Pattern matcher thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// ATR period on the decision timeframe
    pub atr_period: usize,
    /// Session-volume quantile a spike must reach
    pub vol_spike_quantile: f64,
    /// Stop distance multiplier for VA re-entry setups
    pub sl_atr_mult_va_trap: f64,
    /// Breakout/retest buffer around the VA edges, in ATR
    pub va_reentry_buffer_atr: f64,
    /// Stop distance multiplier for the second-entry setup
    pub sl_atr_mult_second_entry: f64,
    /// Target distance multiplier for the second-entry setup
    pub tp_atr_mult_second_entry: f64,
    /// Minimum favorable move (in ATR) before a second entry is considered
    pub second_entry_min_move_atr: f64,
    /// Required pullback as a fraction of the move from the first entry
    pub second_entry_pullback_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// IANA timezone the session windows are expressed in
    pub timezone: String,
    pub asia: WindowConfig,
    pub london: WindowConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// "HH:MM"
    pub start: String,
    /// "HH:MM", inclusive
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Risk per trade as a percentage of balance (0.5 = 0.5%)
    pub risk_per_trade_pct: f64,
    /// Losing streak that blocks new entries until the next day
    pub max_consecutive_loss: usize,
}

/// First take-profit price source when the signal does not carry one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tp1Mode {
    Poc,
    MidVa,
    FixedAtr,
}

/// Breakeven-plus buffer source after TP1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BePlusMode {
    Atr,
    Points,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeManagementConfig {
    /// Size opened per signal
    pub entry_lot: f64,
    /// Size closed at the first target
    pub tp1_close_lot: f64,
    pub tp1_mode: Tp1Mode,
    /// ATR multiplier for the fixed_atr TP1 fallback
    pub tp1_atr: f64,
    pub be_plus_mode: BePlusMode,
    /// BE+ buffer in ATR (atr mode)
    pub be_plus_atr: f64,
    /// BE+ buffer as a raw price offset (points mode)
    pub be_plus_points: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillConfig {
    /// Full spread in points; entry and exit each pay half
    pub spread_points: f64,
    /// One-way slippage in points
    pub slippage_points: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub initial_balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Minute bars CSV (profile input)
    pub bars_m1_csv: String,
    /// M15 bars CSV (decision cadence)
    pub bars_m15_csv: String,
    /// Closed-trade report output
    pub report_csv: String,
}

impl AppConfig {
    /// Load configuration from defaults, optional files and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Symbol defaults (XAUUSD)
            .set_default("symbol.contract_size", 100.0)?
            .set_default("symbol.min_lot", 0.01)?
            .set_default("symbol.lot_step", 0.01)?
            .set_default("symbol.point_value", 0.01)?
            // Volume profile defaults
            .set_default("vp.bin_size", 0.5)?
            .set_default("vp.value_area_pct", 0.7)?
            .set_default("vp.hvn_top_bins", 10)?
            .set_default("vp.lvn_bottom_bins", 10)?
            .set_default("vp.merge_gap_bins", 2)?
            // Rules defaults
            .set_default("rules.atr_period", 14)?
            .set_default("rules.vol_spike_quantile", 0.75)?
            .set_default("rules.sl_atr_mult_va_trap", 1.2)?
            .set_default("rules.va_reentry_buffer_atr", 0.25)?
            .set_default("rules.sl_atr_mult_second_entry", 1.2)?
            .set_default("rules.tp_atr_mult_second_entry", 1.6)?
            .set_default("rules.second_entry_min_move_atr", 1.0)?
            .set_default("rules.second_entry_pullback_pct", 0.5)?
            // Session defaults (instrument-local clock)
            .set_default("sessions.timezone", "Asia/Ho_Chi_Minh")?
            .set_default("sessions.asia.start", "06:00")?
            .set_default("sessions.asia.end", "11:00")?
            .set_default("sessions.london.start", "14:00")?
            .set_default("sessions.london.end", "17:30")?
            // Risk defaults
            .set_default("risk.risk_per_trade_pct", 0.5)?
            .set_default("risk.max_consecutive_loss", 3)?
            // Trade management defaults
            .set_default("trade_management.entry_lot", 0.04)?
            .set_default("trade_management.tp1_close_lot", 0.02)?
            .set_default("trade_management.tp1_mode", "poc")?
            .set_default("trade_management.tp1_atr", 1.0)?
            .set_default("trade_management.be_plus_mode", "atr")?
            .set_default("trade_management.be_plus_atr", 0.1)?
            .set_default("trade_management.be_plus_points", 0.0)?
            // Fill model defaults
            .set_default("fill.spread_points", 30.0)?
            .set_default("fill.slippage_points", 0.0)?
            // Account defaults
            .set_default("account.initial_balance", 10000.0)?
            // Data defaults
            .set_default("data.bars_m1_csv", "data/XAUUSD_M1.csv")?
            .set_default("data.bars_m15_csv", "data/XAUUSD_M15.csv")?
            .set_default("data.report_csv", "reports/trades.csv")?
            // Load config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (VPBOT_*)
            .add_source(Environment::with_prefix("VPBOT").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Parsed session timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.sessions
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", self.sessions.timezone))
    }

    /// Parsed wall-clock window for a named session
    pub fn session_window(&self, session: SessionId) -> Result<SessionWindow> {
        let w = match session {
            SessionId::Asia => &self.sessions.asia,
            SessionId::London => &self.sessions.london,
        };
        SessionWindow::parse(&w.start, &w.end)
    }

    /// One-line digest for startup logging
    pub fn digest(&self) -> String {
        format!(
            "bin_size={} va_pct={} sessions=[asia {}-{}, london {}-{}] risk={}% lot={}",
            self.vp.bin_size,
            self.vp.value_area_pct,
            self.sessions.asia.start,
            self.sessions.asia.end,
            self.sessions.london.start,
            self.sessions.london.end,
            self.risk.risk_per_trade_pct,
            self.trade_management.entry_lot,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_and_parse() {
        let cfg = AppConfig::load().expect("defaults must load");
        assert_eq!(cfg.vp.bin_size, 0.5);
        assert_eq!(cfg.rules.atr_period, 14);
        assert_eq!(cfg.trade_management.tp1_mode, Tp1Mode::Poc);
        assert_eq!(cfg.trade_management.be_plus_mode, BePlusMode::Atr);
        assert!(cfg.timezone().is_ok());
        assert!(cfg.session_window(SessionId::Asia).is_ok());
        assert!(cfg.session_window(SessionId::London).is_ok());
    }

    #[test]
    fn test_digest_mentions_sessions() {
        let cfg = AppConfig::load().unwrap();
        let digest = cfg.digest();
        assert!(digest.contains("asia"));
        assert!(digest.contains("london"));
    }
}
