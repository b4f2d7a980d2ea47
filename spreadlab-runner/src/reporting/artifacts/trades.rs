//! Trade tape export (CSV/JSON).

use anyhow::{Context, Result};
use std::path::Path;

use spreadlab_core::domain::Trade;

const TRADE_COLUMNS: [&str; 25] = [
    "entry_date",
    "exit_date",
    "entry_time",
    "exit_time",
    "hedge_exit_time",
    "direction",
    "type",
    "strike",
    "hedge_strike",
    "spot_open",
    "spot_at_entry",
    "movement_pct",
    "entry_price",
    "exit_price",
    "hedge_entry_price",
    "hedge_exit_price",
    "main_pnl",
    "hedge_pnl",
    "total_pnl",
    "main_pnl_pct",
    "hedge_pnl_pct",
    "total_pnl_pct",
    "entry_reason",
    "exit_reason",
    "hedge_exit_reason",
];

/// Trade tape as CSV text, one row per trade.
pub fn trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS)?;

    for t in trades {
        wtr.write_record([
            t.entry_date.to_string(),
            t.exit_date.to_string(),
            t.entry_time.to_string(),
            t.exit_time.to_string(),
            t.hedge_exit_time.map(|h| h.to_string()).unwrap_or_default(),
            t.direction.to_string(),
            t.instrument.code().to_string(),
            t.main_strike.to_string(),
            t.hedge_strike.to_string(),
            format!("{:.2}", t.spot_open),
            format!("{:.2}", t.spot_at_entry),
            format!("{:.4}", t.movement_pct),
            format!("{:.4}", t.main_entry_price),
            format!("{:.4}", t.main_exit_price),
            format!("{:.4}", t.hedge_entry_price),
            format!("{:.4}", t.hedge_exit_price),
            format!("{:.4}", t.main_pnl),
            format!("{:.4}", t.hedge_pnl),
            format!("{:.4}", t.total_pnl),
            format!("{:.4}", t.main_pnl_pct),
            format!("{:.4}", t.hedge_pnl_pct),
            format!("{:.4}", t.total_pnl_pct),
            t.entry_reason.clone(),
            t.exit_reason.clone(),
            t.hedge_exit_reason.clone().unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    std::fs::write(path, trades_csv(trades)?)
        .with_context(|| format!("Failed to write trades CSV {}", path.display()))
}

pub fn write_trades_json(path: &Path, trades: &[Trade]) -> Result<()> {
    let json = serde_json::to_string_pretty(trades).context("Failed to serialize trades")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write trades JSON {}", path.display()))?;
    Ok(())
}
