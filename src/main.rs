//! Backtest runner: load config and bars, replay, write the trade report.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vpbot::backtest::BacktestEngine;
use vpbot::config::AppConfig;
use vpbot::reporting::{load_bars_csv, save_trades_csv};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::load()?;
    info!(digest = %cfg.digest(), "configuration loaded");

    let bars_m1 = load_bars_csv(&cfg.data.bars_m1_csv)?;
    let bars_m15 = load_bars_csv(&cfg.data.bars_m15_csv)?;

    let engine = BacktestEngine::new(cfg.clone());
    let report = engine.run(bars_m1, bars_m15)?;

    println!("{}", serde_json::to_string_pretty(&report.metrics)?);

    save_trades_csv(&cfg.data.report_csv, &report.trades)?;
    info!(
        path = %cfg.data.report_csv,
        trades = report.trades.len(),
        "trade report written"
    );
    Ok(())
}
