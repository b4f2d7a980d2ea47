//! Calendar P&L breakdowns: daily rows with running totals, monthly and yearly sums.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use spreadlab_core::domain::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    /// Entry date of the trade.
    pub date: NaiveDate,
    pub pnl: f64,
    pub cumulative: f64,
    /// Distance below the running peak of `cumulative`, non-positive.
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPnl {
    /// `YYYY-MM` for months, `YYYY` for years.
    pub period: String,
    pub trades: usize,
    pub pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlSummary {
    pub daily: Vec<DailyPnl>,
    pub monthly: Vec<PeriodPnl>,
    pub yearly: Vec<PeriodPnl>,
}

impl PnlSummary {
    /// Breakdowns keyed by entry date. Trades are expected in date order.
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut daily = Vec::with_capacity(trades.len());
        let mut cumulative = 0.0;
        let mut peak = 0.0_f64;
        for t in trades {
            cumulative += t.total_pnl;
            peak = peak.max(cumulative);
            daily.push(DailyPnl {
                date: t.entry_date,
                pnl: t.total_pnl,
                cumulative,
                drawdown: cumulative - peak,
            });
        }

        let monthly = group(trades, |d| format!("{:04}-{:02}", d.year(), d.month()));
        let yearly = group(trades, |d| format!("{:04}", d.year()));
        Self { daily, monthly, yearly }
    }

    pub fn total(&self) -> f64 {
        self.daily.last().map_or(0.0, |d| d.cumulative)
    }
}

fn group(trades: &[Trade], key: impl Fn(NaiveDate) -> String) -> Vec<PeriodPnl> {
    let mut buckets: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for t in trades {
        let entry = buckets.entry(key(t.entry_date)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += t.total_pnl;
    }
    buckets
        .into_iter()
        .map(|(period, (trades, pnl))| PeriodPnl { period, trades, pnl })
        .collect()
}
