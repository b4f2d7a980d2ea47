//! P&L breakdown and parameter exports (CSV).

use anyhow::{Context, Result};
use std::path::Path;

use crate::pnl::{DailyPnl, PeriodPnl};

fn finish(wtr: csv::Writer<Vec<u8>>, path: &Path) -> Result<()> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_daily_csv(path: &Path, rows: &[DailyPnl]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "pnl", "cumulative_pnl", "drawdown"])?;
    for r in rows {
        wtr.write_record([
            r.date.to_string(),
            format!("{:.4}", r.pnl),
            format!("{:.4}", r.cumulative),
            format!("{:.4}", r.drawdown),
        ])?;
    }
    finish(wtr, path)
}

/// Monthly or yearly totals; `label` names the period column.
pub fn write_period_csv(path: &Path, label: &str, rows: &[PeriodPnl]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([label, "trades", "pnl"])?;
    for r in rows {
        wtr.write_record([r.period.clone(), r.trades.to_string(), format!("{:.4}", r.pnl)])?;
    }
    finish(wtr, path)
}

pub fn write_parameters_csv(path: &Path, params: &[(String, String)]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["parameter", "value"])?;
    for (name, value) in params {
        wtr.write_record([name, value])?;
    }
    finish(wtr, path)
}
