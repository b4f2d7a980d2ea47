//! Artifact manager for persisting run outputs.

mod manifest;
mod pnl;
mod trades;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::runner::BacktestResult;

pub use manifest::read_manifest;
pub use trades::trades_csv;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub manifest: PathBuf,
    pub trades_csv: PathBuf,
    pub trades_json: PathBuf,
    pub daily_pnl_csv: PathBuf,
    pub monthly_pnl_csv: PathBuf,
    pub yearly_pnl_csv: PathBuf,
    pub parameters_csv: PathBuf,
    pub report_markdown: Option<PathBuf>,
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create artifact output directory")?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save complete run artifacts under `<output_dir>/<run_id>/`.
    pub fn save_run(&self, result: &BacktestResult) -> Result<ArtifactPaths> {
        let run_dir = self.output_dir.join(&result.run_id);
        std::fs::create_dir_all(&run_dir).context("Failed to create run artifact directory")?;

        let manifest_path = run_dir.join("manifest.json");
        manifest::write_manifest(&manifest_path, result)?;

        let trades_csv = run_dir.join("trades.csv");
        let trades_json = run_dir.join("trades.json");
        trades::write_trades_csv(&trades_csv, &result.trades)?;
        trades::write_trades_json(&trades_json, &result.trades)?;

        let daily_pnl_csv = run_dir.join("daily_pnl.csv");
        let monthly_pnl_csv = run_dir.join("monthly_pnl.csv");
        let yearly_pnl_csv = run_dir.join("yearly_pnl.csv");
        pnl::write_daily_csv(&daily_pnl_csv, &result.pnl.daily)?;
        pnl::write_period_csv(&monthly_pnl_csv, "month", &result.pnl.monthly)?;
        pnl::write_period_csv(&yearly_pnl_csv, "year", &result.pnl.yearly)?;

        let parameters_csv = run_dir.join("parameters.csv");
        pnl::write_parameters_csv(&parameters_csv, &result.strategy.parameter_table())?;

        Ok(ArtifactPaths {
            run_dir,
            manifest: manifest_path,
            trades_csv,
            trades_json,
            daily_pnl_csv,
            monthly_pnl_csv,
            yearly_pnl_csv,
            parameters_csv,
            report_markdown: None,
        })
    }
}
