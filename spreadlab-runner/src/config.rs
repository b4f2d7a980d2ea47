//! Serializable backtest configuration loaded from TOML.
//!
//! A config file has four sections:
//!
//! ```toml
//! [strategy]
//! entry_time = "15:25:00"
//! lot_size = 1
//!
//! [strategy.exit_policy]
//! type = "independent_trail"
//! buffer = 0.05
//!
//! [data]
//! opt_db = "OPT.db"
//! spot_db = "SPOT.db"
//! use_sample = false
//!
//! [run]
//! parallel = true
//!
//! [output]
//! dir = "output"
//! report = true
//! ```
//!
//! Only `[strategy.exit_policy]` is mandatory; every other field has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use spreadlab_core::config::{ConfigError as StrategyError, StrategyConfig};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy parameters: {0}")]
    Strategy(#[from] StrategyError),

    #[error("invalid data section: {0}")]
    Data(String),
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub run: RunOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_opt_db")]
    pub opt_db: PathBuf,
    #[serde(default = "default_spot_db")]
    pub spot_db: PathBuf,
    /// Read the `_sample` siblings of both databases instead.
    #[serde(default)]
    pub use_sample: bool,
    /// Generate a seeded synthetic market instead of reading SQLite.
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Weekdays generated in synthetic mode.
    #[serde(default = "default_synthetic_days")]
    pub synthetic_days: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Simulate dates on the rayon pool. Output order is unaffected.
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Write `report.md` next to the CSV and JSON artifacts.
    #[serde(default = "default_true")]
    pub report: bool,
}

fn default_opt_db() -> PathBuf {
    PathBuf::from("OPT.db")
}

fn default_spot_db() -> PathBuf {
    PathBuf::from("SPOT.db")
}

fn default_seed() -> u64 {
    42
}

fn default_synthetic_days() -> usize {
    20
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_true() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            opt_db: default_opt_db(),
            spot_db: default_spot_db(),
            use_sample: false,
            synthetic: false,
            seed: default_seed(),
            synthetic_days: default_synthetic_days(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            report: true,
        }
    }
}

impl BacktestConfig {
    /// Config with default data, run and output sections.
    pub fn new(strategy: StrategyConfig) -> Self {
        Self {
            strategy,
            data: DataConfig::default(),
            run: RunOptions::default(),
            output: OutputConfig::default(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        if self.data.synthetic && self.data.synthetic_days < 2 {
            return Err(ConfigError::Data(
                "synthetic_days must be at least 2 (the last date never trades)".into(),
            ));
        }
        Ok(())
    }

    /// Deterministic hash of everything that affects the trades.
    ///
    /// The output section is excluded, so writing the same run to another
    /// directory keeps its identity.
    pub fn run_id(&self) -> RunId {
        let identity = serde_json::json!({
            "strategy": self.strategy,
            "data": self.data,
        });
        let hash = blake3::hash(identity.to_string().as_bytes());
        hash.to_hex()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spreadlab_core::config::ExitPolicyConfig;

    const MINIMAL: &str = r#"
[strategy.exit_policy]
type = "coupled_trail"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = BacktestConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(cfg.strategy.exit_policy, ExitPolicyConfig::CoupledTrail);
        assert_eq!(cfg.data.opt_db, PathBuf::from("OPT.db"));
        assert!(!cfg.data.synthetic);
        assert!(!cfg.run.parallel);
        assert!(cfg.output.report);
        assert_eq!(cfg.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn missing_exit_policy_is_rejected() {
        let err = BacktestConfig::from_toml("[strategy]\nlot_size = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn full_config_parses() {
        let toml_str = r#"
[strategy]
entry_time = "15:20:00"
lot_size = 25
hedge_offset = 0.03

[strategy.exit_policy]
type = "independent_trail"
buffer = 0.03

[data]
opt_db = "/data/OPT.db"
spot_db = "/data/SPOT.db"
use_sample = true

[run]
parallel = true

[output]
dir = "results"
report = false
"#;
        let cfg = BacktestConfig::from_toml(toml_str).unwrap();
        assert_eq!(cfg.strategy.lot_size, 25);
        assert_eq!(cfg.strategy.exit_policy, ExitPolicyConfig::IndependentTrail { buffer: 0.03 });
        assert!(cfg.data.use_sample);
        assert!(cfg.run.parallel);
        assert!(!cfg.output.report);
    }

    #[test]
    fn invalid_strategy_is_rejected() {
        let toml_str = r#"
[strategy]
lot_size = 0

[strategy.exit_policy]
type = "coupled_trail"
"#;
        assert!(matches!(
            BacktestConfig::from_toml(toml_str),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_ignores_output() {
        let a = BacktestConfig::from_toml(MINIMAL).unwrap();
        let mut b = a.clone();
        b.output.dir = PathBuf::from("elsewhere");
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 16);

        b.strategy.lot_size = 50;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BacktestConfig::from_file(Path::new("/nonexistent/spreadlab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
