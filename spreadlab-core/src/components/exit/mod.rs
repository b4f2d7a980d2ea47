//! Exit engine: decides when each leg of the spread is closed on the exit morning.
//!
//! A policy receives the main (short) and hedge (long) series for the exit
//! date, already truncated at the exit cutoff, and returns one exit per leg.
//! Prices are raw closes; slippage is applied by the simulator.

pub mod coupled;
pub mod independent;
pub mod rolling;

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ExitPolicyConfig, StrategyConfig};
use crate::domain::{LegRole, PriceBar};

pub use coupled::CoupledTrail;
pub use independent::IndependentTrail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    MainTrailStop,
    HedgeTrailStop,
    TrailStopHit,
    TimeExit,
}

impl ExitReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::MainTrailStop => "Main Trail Stop",
            Self::HedgeTrailStop => "Hedge Trail Stop",
            Self::TrailStopHit => "Trail Stop Hit",
            Self::TimeExit => "Time Exit",
        }
    }

    pub fn is_stop(self) -> bool {
        !matches!(self, Self::TimeExit)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exit of one leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegExit {
    pub time: NaiveTime,
    pub price: f64,
    pub reason: ExitReason,
}

impl LegExit {
    fn at(bar: &PriceBar, reason: ExitReason) -> Self {
        Self {
            time: bar.time,
            price: bar.close,
            reason,
        }
    }
}

/// Exits for both legs. `coupled` is set when the policy closes the legs as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadExit {
    pub main: LegExit,
    pub hedge: LegExit,
    pub coupled: bool,
}

impl SpreadExit {
    /// Time the spread is fully closed.
    pub fn exit_time(&self) -> NaiveTime {
        self.main.time.max(self.hedge.time)
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ExitError {
    #[error("No Data")]
    NoData { leg: LegRole },
}

pub trait ExitPolicy: Send + Sync {
    /// Stable identifier recorded on every trade (e.g. "coupled_trail").
    fn name(&self) -> &str;

    fn evaluate(&self, main: &[PriceBar], hedge: &[PriceBar]) -> Result<SpreadExit, ExitError>;
}

/// Builds the configured exit policy.
pub fn create_exit_policy(config: &StrategyConfig) -> Box<dyn ExitPolicy> {
    match config.exit_policy {
        ExitPolicyConfig::CoupledTrail => Box::new(CoupledTrail::new(config.trail_window)),
        ExitPolicyConfig::IndependentTrail { buffer } => {
            Box::new(IndependentTrail::new(config.trail_window, buffer))
        }
    }
}

fn require_bars(bars: &[PriceBar], leg: LegRole) -> Result<(), ExitError> {
    if bars.is_empty() {
        Err(ExitError::NoData { leg })
    } else {
        Ok(())
    }
}
