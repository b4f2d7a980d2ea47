//! Provider construction for the runner.
//!
//! Resolves a `[data]` section into a concrete provider:
//! 1. `synthetic = true` → a seeded synthetic market held in memory
//! 2. `use_sample = true` → the `_sample` siblings of both SQLite databases
//! 3. otherwise → the SQLite databases as named
//!
//! Missing database files fail here with the resolved path, before any date
//! is simulated.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use spreadlab_core::config::StrategyConfig;
use spreadlab_core::data::{DataError, PriceSeriesProvider, SqliteProvider, SyntheticMarket};

use crate::config::DataConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("database not found: {path} (use --synthetic to run without market data)")]
    MissingDatabase { path: PathBuf },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Where the bars of a run came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sqlite { opt_db: PathBuf, spot_db: PathBuf },
    Synthetic { seed: u64, days: usize },
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite { opt_db, spot_db } => {
                write!(f, "sqlite ({}, {})", opt_db.display(), spot_db.display())
            }
            Self::Synthetic { seed, days } => write!(f, "synthetic (seed {seed}, {days} days)"),
        }
    }
}

pub struct LoadedProvider {
    pub provider: Box<dyn PriceSeriesProvider>,
    pub source: DataSource,
}

/// Build the provider described by `data`, with option queries limited to the
/// strategy's session window.
pub fn load_provider(
    data: &DataConfig,
    strategy: &StrategyConfig,
) -> Result<LoadedProvider, LoadError> {
    if data.synthetic {
        let market = SyntheticMarket {
            seed: data.seed,
            days: data.synthetic_days,
            session_open: strategy.market_open,
            session_close: strategy.session_close,
            ..SyntheticMarket::default()
        };
        let source = DataSource::Synthetic {
            seed: data.seed,
            days: data.synthetic_days,
        };
        info!(%source, "generating synthetic market");
        return Ok(LoadedProvider {
            provider: Box::new(market.build()),
            source,
        });
    }

    let sqlite = if data.use_sample {
        SqliteProvider::sample(&data.opt_db, &data.spot_db)
    } else {
        SqliteProvider::new(&data.opt_db, &data.spot_db)
    }
    .with_session(strategy.market_open, strategy.session_close);

    require_file(sqlite.opt_db())?;
    require_file(sqlite.spot_db())?;

    let source = DataSource::Sqlite {
        opt_db: sqlite.opt_db().to_path_buf(),
        spot_db: sqlite.spot_db().to_path_buf(),
    };
    info!(%source, "using sqlite databases");
    Ok(LoadedProvider {
        provider: Box::new(sqlite),
        source,
    })
}

fn require_file(path: &Path) -> Result<(), LoadError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LoadError::MissingDatabase {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spreadlab_core::config::ExitPolicyConfig;

    fn strategy() -> StrategyConfig {
        StrategyConfig::new(ExitPolicyConfig::CoupledTrail)
    }

    #[test]
    fn synthetic_source_needs_no_files() {
        let data = DataConfig {
            synthetic: true,
            synthetic_days: 5,
            ..DataConfig::default()
        };
        let loaded = load_provider(&data, &strategy()).unwrap();
        assert_eq!(loaded.source, DataSource::Synthetic { seed: 42, days: 5 });
        assert_eq!(loaded.provider.list_trading_dates().unwrap().len(), 5);
    }

    #[test]
    fn missing_database_names_the_resolved_path() {
        let data = DataConfig {
            opt_db: PathBuf::from("/nonexistent/OPT.db"),
            spot_db: PathBuf::from("/nonexistent/SPOT.db"),
            use_sample: true,
            ..DataConfig::default()
        };
        match load_provider(&data, &strategy()) {
            Err(LoadError::MissingDatabase { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/OPT_sample.db"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a missing database"),
        }
    }
}
