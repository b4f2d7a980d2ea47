//! Integration tests for the runner: full runs over synthetic markets and
//! providers that fail or panic on chosen dates.

use chrono::{NaiveDate, NaiveTime};
use std::path::PathBuf;

use spreadlab_core::config::{ExitPolicyConfig, StrategyConfig};
use spreadlab_core::data::{
    DataError, InMemoryProvider, OptionFilter, PriceSeriesProvider, SyntheticMarket,
};
use spreadlab_core::domain::{OptionBar, PriceBar, Strike};
use spreadlab_runner::config::BacktestConfig;
use spreadlab_runner::runner::{run_backtest, run_from_config, RunError};
use spreadlab_runner::LoadError;

fn synthetic_config(days: usize, policy: ExitPolicyConfig) -> BacktestConfig {
    let mut cfg = BacktestConfig::new(StrategyConfig::new(policy));
    cfg.data.synthetic = true;
    cfg.data.synthetic_days = days;
    cfg
}

fn market(days: usize) -> (SyntheticMarket, InMemoryProvider) {
    let market = SyntheticMarket {
        days,
        ..SyntheticMarket::default()
    };
    let provider = market.build();
    (market, provider)
}

#[test]
fn synthetic_run_from_config_trades_all_but_last_date() {
    let cfg = synthetic_config(8, ExitPolicyConfig::CoupledTrail);
    let result = run_from_config(&cfg).unwrap();

    assert_eq!(result.summary.dates_processed, 8);
    assert_eq!(result.summary.trades, 7);
    assert_eq!(result.summary.skipped, 1);
    assert_eq!(result.summary.failed, 0);
    assert!(result.data_source.starts_with("synthetic"));
    assert_eq!(result.exit_policy, "coupled_trail");
    assert_eq!(result.run_id, cfg.run_id());

    // trades come out in date order
    assert!(result
        .trades
        .windows(2)
        .all(|w| w[0].entry_date < w[1].entry_date));
    let sum: f64 = result.trades.iter().map(|t| t.total_pnl).sum();
    assert!((result.metrics.total_pnl - sum).abs() < 1e-9);
    assert!((result.pnl.total() - sum).abs() < 1e-9);
}

#[test]
fn parallel_run_matches_sequential() {
    let (_, provider) = market(10);
    let mut cfg = synthetic_config(10, ExitPolicyConfig::independent());

    cfg.run.parallel = false;
    let sequential = run_backtest(&provider, &cfg).unwrap();
    cfg.run.parallel = true;
    let parallel = run_backtest(&provider, &cfg).unwrap();

    assert_eq!(
        serde_json::to_string(&sequential.trades).unwrap(),
        serde_json::to_string(&parallel.trades).unwrap()
    );
    assert_eq!(sequential.summary, parallel.summary);
}

#[test]
fn repeated_runs_are_identical() {
    let cfg = synthetic_config(6, ExitPolicyConfig::CoupledTrail);
    let a = run_from_config(&cfg).unwrap();
    let b = run_from_config(&cfg).unwrap();
    assert_eq!(a.run_id, b.run_id);
    assert_eq!(
        serde_json::to_string(&a.trades).unwrap(),
        serde_json::to_string(&b.trades).unwrap()
    );
    assert_eq!(a.metrics, b.metrics);
}

#[test]
fn exit_policy_is_recorded_on_every_trade() {
    let cfg = synthetic_config(5, ExitPolicyConfig::independent());
    let result = run_from_config(&cfg).unwrap();
    assert_eq!(result.exit_policy, "independent_trail");
    assert!(result
        .trades
        .iter()
        .all(|t| t.exit_policy == "independent_trail" && t.hedge_exit_time.is_some()));
}

// ── Failure isolation ──

/// Delegates to an in-memory market but errors on one date and panics on another.
struct FaultyProvider {
    inner: InMemoryProvider,
    fail_on: NaiveDate,
    panic_on: NaiveDate,
}

impl PriceSeriesProvider for FaultyProvider {
    fn name(&self) -> &str {
        "faulty"
    }

    fn list_trading_dates(&self) -> Result<Vec<NaiveDate>, DataError> {
        self.inner.list_trading_dates()
    }

    fn underlying_series(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<PriceBar>, DataError> {
        if date == self.fail_on {
            return Err(DataError::Other("disk read failed".into()));
        }
        if date == self.panic_on {
            panic!("corrupt page on {date}");
        }
        self.inner.underlying_series(date, start, end)
    }

    fn option_series(
        &self,
        date: NaiveDate,
        filter: &OptionFilter,
    ) -> Result<Vec<OptionBar>, DataError> {
        self.inner.option_series(date, filter)
    }

    fn list_strikes(&self, date: NaiveDate, expiry: NaiveDate) -> Result<Vec<Strike>, DataError> {
        self.inner.list_strikes(date, expiry)
    }
}

#[test]
fn errors_and_panics_fail_single_dates_only() {
    let (market, inner) = market(6);
    let dates = market.trading_dates();
    let provider = FaultyProvider {
        inner,
        fail_on: dates[1],
        panic_on: dates[2],
    };
    let cfg = synthetic_config(6, ExitPolicyConfig::CoupledTrail);
    let result = run_backtest(&provider, &cfg).unwrap();
    let s = &result.summary;

    assert_eq!(s.dates_processed, 6);
    assert_eq!(s.failed, 2);
    assert_eq!(s.skipped, 1);
    assert_eq!(s.trades, 3);
    assert_eq!(s.failures[0].date, dates[1]);
    assert!(s.failures[0].reason.contains("disk read failed"));
    assert_eq!(s.failures[1].date, dates[2]);
    assert!(s.failures[1].reason.starts_with("panic: corrupt page"));
    assert!(result.trades.iter().all(|t| t.entry_date != dates[1] && t.entry_date != dates[2]));
}

#[test]
fn missing_database_stops_the_run() {
    let mut cfg = BacktestConfig::new(StrategyConfig::new(ExitPolicyConfig::CoupledTrail));
    cfg.data.opt_db = PathBuf::from("/nonexistent/OPT.db");
    cfg.data.spot_db = PathBuf::from("/nonexistent/SPOT.db");
    assert!(matches!(
        run_from_config(&cfg),
        Err(RunError::Load(LoadError::MissingDatabase { .. }))
    ));
}

#[test]
fn empty_provider_gives_empty_result() {
    let provider = InMemoryProvider::new();
    let cfg = BacktestConfig::new(StrategyConfig::new(ExitPolicyConfig::CoupledTrail));
    let result = run_backtest(&provider, &cfg).unwrap();
    assert_eq!(result.summary.dates_processed, 0);
    assert!(result.trades.is_empty());
    assert_eq!(result.metrics.trade_count, 0);
}
