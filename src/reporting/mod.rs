//! CSV data ingest and trade report output

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::types::{Bar, ClosedTrade};

/// Load OHLCV bars from a CSV with RFC 3339 timestamps, sorted by time.
pub fn load_bars_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("opening bars csv {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars: Vec<Bar> = Vec::new();
    for record in reader.deserialize() {
        let bar: Bar =
            record.with_context(|| format!("parsing bar row in {}", path.display()))?;
        bars.push(bar);
    }
    bars.sort_by_key(|b| b.time);

    info!(count = bars.len(), path = %path.display(), "bars loaded");
    Ok(bars)
}

/// Write the closed-trade log as CSV, creating parent directories.
pub fn save_trades_csv(path: impl AsRef<Path>, trades: &[ClosedTrade]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating report csv {}", path.display()))?;
    for trade in trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    Ok(())
}
