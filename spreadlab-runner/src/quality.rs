//! Data-quality diagnostics for a provider.
//!
//! For each inspected date: underlying bar count and time range, the option
//! chain's size, expiries, strike range and instruments, and whether the
//! contracts the simulator would trade have bars on the following exit
//! morning. Gaps found here explain most skipped dates in a run.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use spreadlab_core::config::StrategyConfig;
use spreadlab_core::data::{DataError, OptionFilter, PriceSeriesProvider};
use spreadlab_core::domain::{InstrumentType, LegRole, Strike};
use spreadlab_core::engine::TradeSimulator;

/// A full session is ~375 one-minute bars; fewer than this is flagged.
pub const MIN_SESSION_BARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegCoverage {
    pub role: LegRole,
    pub strike: Strike,
    pub instrument: InstrumentType,
    pub rows: usize,
    /// Rows at or before the exit cutoff.
    pub morning_rows: usize,
    pub first: Option<NaiveTime>,
    pub last: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateQuality {
    pub date: NaiveDate,
    pub spot_bars: usize,
    pub spot_range: Option<(NaiveTime, NaiveTime)>,
    pub option_rows: usize,
    pub expiries: Vec<NaiveDate>,
    pub strike_range: Option<(Strike, Strike)>,
    pub instruments: Vec<InstrumentType>,
    /// Trading date the legs would be closed on.
    pub exit_date: Option<NaiveDate>,
    pub exit_coverage: Vec<LegCoverage>,
    pub issues: Vec<String>,
}

impl DateQuality {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_dates: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub dates: Vec<DateQuality>,
}

impl QualityReport {
    pub fn issue_count(&self) -> usize {
        self.dates.iter().map(|d| d.issues.len()).sum()
    }

    /// Plain-text rendering for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Dates in database: {}\n", self.total_dates));
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            out.push_str(&format!("Date range: {first} to {last}\n"));
        }
        for d in &self.dates {
            out.push_str(&format!("\n{}\n", d.date));
            match d.spot_range {
                Some((from, to)) => out.push_str(&format!(
                    "  spot: {} bars ({from} to {to})\n",
                    d.spot_bars
                )),
                None => out.push_str("  spot: no bars\n"),
            }
            out.push_str(&format!("  options: {} rows", d.option_rows));
            if let Some((lo, hi)) = d.strike_range {
                let instruments: Vec<&str> = d.instruments.iter().map(|i| i.code()).collect();
                out.push_str(&format!(
                    ", {} expiries (nearest {}), strikes {lo} to {hi}, {}",
                    d.expiries.len(),
                    d.expiries.first().map(|e| e.to_string()).unwrap_or_default(),
                    instruments.join("/"),
                ));
            }
            out.push('\n');
            if let Some(exit_date) = d.exit_date {
                for leg in &d.exit_coverage {
                    out.push_str(&format!(
                        "  {exit_date} {} {} {}: {} rows, {} morning\n",
                        leg.role, leg.instrument, leg.strike, leg.rows, leg.morning_rows
                    ));
                }
            }
            for issue in &d.issues {
                out.push_str(&format!("  ! {issue}\n"));
            }
        }
        out.push_str(&format!("\n{} issue(s) found\n", self.issue_count()));
        out
    }
}

/// Inspect the first `limit` dates (all dates when `None`).
///
/// Provider errors on a single date are recorded as issues; only a failure to
/// list the dates aborts the inspection.
pub fn inspect(
    provider: &dyn PriceSeriesProvider,
    config: &StrategyConfig,
    limit: Option<usize>,
) -> Result<QualityReport, DataError> {
    let sim = TradeSimulator::from_provider(provider, config.clone())?;
    let all = sim.calendar().dates();
    let take = limit.unwrap_or(all.len()).min(all.len());

    let dates = all[..take]
        .iter()
        .map(|&date| inspect_date(provider, &sim, config, date))
        .collect();

    Ok(QualityReport {
        total_dates: all.len(),
        first_date: all.first().copied(),
        last_date: all.last().copied(),
        dates,
    })
}

fn inspect_date(
    provider: &dyn PriceSeriesProvider,
    sim: &TradeSimulator<'_>,
    config: &StrategyConfig,
    date: NaiveDate,
) -> DateQuality {
    let mut q = DateQuality {
        date,
        spot_bars: 0,
        spot_range: None,
        option_rows: 0,
        expiries: Vec::new(),
        strike_range: None,
        instruments: Vec::new(),
        exit_date: sim.calendar().next_trading_date(date),
        exit_coverage: Vec::new(),
        issues: Vec::new(),
    };

    match provider.underlying_series(date, config.market_open, config.session_close) {
        Ok(bars) => {
            q.spot_bars = bars.len();
            q.spot_range = bars.first().zip(bars.last()).map(|(a, b)| (a.time, b.time));
            if bars.is_empty() {
                q.issues.push("no spot data".into());
            } else if bars.len() < MIN_SESSION_BARS {
                q.issues.push(format!("only {} spot bars", bars.len()));
            }
        }
        Err(e) => q.issues.push(format!("spot query failed: {e}")),
    }

    match provider.option_series(date, &OptionFilter::all()) {
        Ok(rows) => {
            q.option_rows = rows.len();
            let expiries: BTreeSet<NaiveDate> = rows.iter().map(|r| r.expiry).collect();
            q.expiries = expiries.into_iter().collect();
            q.strike_range = rows
                .iter()
                .map(|r| r.strike)
                .min()
                .zip(rows.iter().map(|r| r.strike).max());
            for inst in [InstrumentType::Put, InstrumentType::Call] {
                if rows.iter().any(|r| r.instrument == inst) {
                    q.instruments.push(inst);
                }
            }
            if rows.is_empty() {
                q.issues.push("no option data".into());
            }
        }
        Err(e) => q.issues.push(format!("option query failed: {e}")),
    }

    let Some(exit_date) = q.exit_date else {
        return q;
    };
    let plan = match sim.plan(date) {
        Ok(plan) => plan,
        Err(reason) => {
            debug!(%date, %reason, "no contracts to check");
            q.issues.push(format!("no tradable contracts: {reason}"));
            return q;
        }
    };

    let legs = [
        (LegRole::Main, plan.selection.atm),
        (LegRole::Hedge, plan.selection.hedge),
    ];
    for (role, strike) in legs {
        let instrument = plan.selection.instrument;
        match provider.option_series(exit_date, &OptionFilter::contract(strike, instrument)) {
            Ok(rows) => {
                let morning_rows = rows.iter().filter(|r| r.time() <= config.exit_cutoff).count();
                if rows.is_empty() {
                    q.issues.push(format!("no {instrument} {strike} data on {exit_date}"));
                } else if morning_rows == 0 {
                    q.issues.push(format!(
                        "no morning data for {instrument} {strike} on {exit_date}"
                    ));
                }
                q.exit_coverage.push(LegCoverage {
                    role,
                    strike,
                    instrument,
                    rows: rows.len(),
                    morning_rows,
                    first: rows.first().map(|r| r.time()),
                    last: rows.last().map(|r| r.time()),
                });
            }
            Err(e) => q.issues.push(format!("{role} leg query on {exit_date} failed: {e}")),
        }
    }
    q
}
