//! SpreadLab Runner: backtest orchestration, metrics, P&L breakdowns, reporting.
//!
//! This crate builds on `spreadlab-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Provider construction for SQLite, sample and synthetic data
//! - A runner that simulates every date, sequentially or on the rayon pool
//! - Performance metrics and calendar P&L breakdowns
//! - Data-quality diagnostics
//! - CSV, JSON and Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod pnl;
pub mod quality;
pub mod reporting;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, DataConfig, OutputConfig, RunOptions};
pub use data_loader::{load_provider, DataSource, LoadError, LoadedProvider};
pub use metrics::PerformanceMetrics;
pub use pnl::{DailyPnl, PeriodPnl, PnlSummary};
pub use quality::{inspect, QualityReport};
pub use reporting::export::export_run_with_report;
pub use reporting::{ArtifactManager, ArtifactPaths};
pub use runner::{run_backtest, run_from_config, BacktestResult, RunError, RunSummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<QualityReport>();
        assert_sync::<QualityReport>();
    }

    #[test]
    fn config_and_provider_are_send() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadedProvider>();
    }
}
