//! Backtest runner: wires together provider, simulator, metrics and P&L breakdowns.
//!
//! Two entry points:
//! - `run_from_config()`: builds the provider from the `[data]` section, then runs. Used by the CLI.
//! - `run_backtest()`: runs against any provider. Used by tests and benchmarks.
//!
//! Every trading date ends in a trade, a skip or a failure. Skips are ordinary
//! data gaps; failures are provider errors and panics inside one date's
//! simulation. Neither stops the run.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use spreadlab_core::config::StrategyConfig;
use spreadlab_core::data::{DataError, PriceSeriesProvider};
use spreadlab_core::domain::Trade;
use spreadlab_core::engine::TradeSimulator;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_provider, LoadError};
use crate::metrics::PerformanceMetrics;
use crate::pnl::PnlSummary;

/// Errors that stop a run before any date is simulated.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("cannot list trading dates: {0}")]
    Calendar(#[from] DataError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// A date whose simulation failed unexpectedly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub dates_processed: usize,
    pub trades: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Skip counts keyed by reason.
    pub skip_reasons: BTreeMap<String, usize>,
    #[serde(default)]
    pub failures: Vec<DateFailure>,
}

impl RunSummary {
    pub fn success_rate(&self) -> f64 {
        if self.dates_processed == 0 {
            return 0.0;
        }
        self.trades as f64 / self.dates_processed as f64
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub exit_policy: String,
    pub data_source: String,
    pub strategy: StrategyConfig,
    pub trades: Vec<Trade>,
    pub summary: RunSummary,
    pub metrics: PerformanceMetrics,
    pub pnl: PnlSummary,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// What happened on one entry date.
#[derive(Debug)]
enum DateOutcome {
    Traded(Box<Trade>),
    Skipped(&'static str),
    Failed(String),
}

/// Load the provider named by `config.data` and run the backtest on it.
pub fn run_from_config(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_provider(&config.data, &config.strategy)?;
    let mut result = run_backtest(loaded.provider.as_ref(), config)?;
    result.data_source = loaded.source.to_string();
    Ok(result)
}

/// Simulate every trading date the provider lists, in calendar order.
pub fn run_backtest(
    provider: &dyn PriceSeriesProvider,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id();
    let sim = TradeSimulator::from_provider(provider, config.strategy.clone())?;
    let dates = sim.calendar().dates();

    info!(
        %run_id,
        provider = provider.name(),
        dates = dates.len(),
        exit_policy = sim.exit_policy_name(),
        parallel = config.run.parallel,
        "backtest started"
    );

    let outcomes: Vec<(NaiveDate, DateOutcome)> = if config.run.parallel {
        dates
            .par_iter()
            .map(|&date| (date, simulate_date(&sim, date)))
            .collect()
    } else {
        dates
            .iter()
            .map(|&date| (date, simulate_date(&sim, date)))
            .collect()
    };

    let mut summary = RunSummary {
        dates_processed: outcomes.len(),
        ..RunSummary::default()
    };
    let mut trades = Vec::new();
    for (date, outcome) in outcomes {
        match outcome {
            DateOutcome::Traded(trade) => trades.push(*trade),
            DateOutcome::Skipped(key) => {
                summary.skipped += 1;
                *summary.skip_reasons.entry(key.to_string()).or_insert(0) += 1;
            }
            DateOutcome::Failed(reason) => {
                summary.failed += 1;
                summary.failures.push(DateFailure { date, reason });
            }
        }
    }
    summary.trades = trades.len();

    let metrics = PerformanceMetrics::compute(&trades);
    let pnl = PnlSummary::from_trades(&trades);

    info!(
        %run_id,
        trades = summary.trades,
        skipped = summary.skipped,
        failed = summary.failed,
        total_pnl = metrics.total_pnl,
        "backtest finished: {}/{} dates traded",
        summary.trades,
        summary.dates_processed
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        exit_policy: sim.exit_policy_name().to_string(),
        data_source: provider.name().to_string(),
        strategy: config.strategy.clone(),
        trades,
        summary,
        metrics,
        pnl,
    })
}

/// Simulate one date, converting skips, provider errors and panics into an outcome.
fn simulate_date(sim: &TradeSimulator<'_>, date: NaiveDate) -> DateOutcome {
    match catch_unwind(AssertUnwindSafe(|| sim.simulate(date))) {
        Ok(Ok(trade)) => DateOutcome::Traded(Box::new(trade)),
        Ok(Err(reason)) if reason.is_failure() => {
            warn!(%date, %reason, "date failed");
            DateOutcome::Failed(reason.to_string())
        }
        Ok(Err(reason)) => {
            debug!(%date, %reason, "date skipped");
            DateOutcome::Skipped(reason.key())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%date, panic = %message, "simulation panicked");
            DateOutcome::Failed(format!("panic: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
