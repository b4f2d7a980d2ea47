//! Strategy configuration: the immutable parameter set every component is built from.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default trailing-stop buffer for the independent exit policy.
///
/// The value that shipped is 5%, while the accompanying note described 3%.
/// Which one is intended is unresolved; 5% is kept and the buffer is configurable.
pub const DEFAULT_TRAIL_BUFFER: f64 = 0.05;

/// Which exit policy runs on the morning after entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitPolicyConfig {
    /// Rolling-high trail on both legs, scanned in lockstep; either trigger closes the spread.
    CoupledTrail,

    /// Side-aware trail evaluated per leg with a percentage buffer; legs exit on their own.
    IndependentTrail {
        #[serde(default = "default_buffer")]
        buffer: f64,
    },
}

impl ExitPolicyConfig {
    pub fn independent() -> Self {
        Self::IndependentTrail { buffer: DEFAULT_TRAIL_BUFFER }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CoupledTrail => "coupled_trail",
            Self::IndependentTrail { .. } => "independent_trail",
        }
    }
}

fn default_buffer() -> f64 {
    DEFAULT_TRAIL_BUFFER
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}

fn default_market_open() -> NaiveTime {
    hms(9, 15, 0)
}

fn default_entry_time() -> NaiveTime {
    hms(15, 25, 0)
}

fn default_session_close() -> NaiveTime {
    hms(15, 30, 0)
}

fn default_exit_cutoff() -> NaiveTime {
    hms(9, 45, 0)
}

fn default_slippage() -> f64 {
    0.005
}

fn default_hedge_offset() -> f64 {
    0.02
}

fn default_trail_window() -> usize {
    3
}

fn default_lot_size() -> u32 {
    1
}

/// Parameters of the overnight spread strategy.
///
/// There is deliberately no `Default`: the exit policy must be chosen explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Session open, used for the direction read and as the start of every query window.
    #[serde(default = "default_market_open")]
    pub market_open: NaiveTime,
    /// Decision and entry time.
    #[serde(default = "default_entry_time")]
    pub entry_time: NaiveTime,
    /// End of the session window queried from storage.
    #[serde(default = "default_session_close")]
    pub session_close: NaiveTime,
    /// Latest bar considered on the exit morning.
    #[serde(default = "default_exit_cutoff")]
    pub exit_cutoff: NaiveTime,
    #[serde(default = "default_slippage")]
    pub entry_slippage: f64,
    #[serde(default = "default_slippage")]
    pub exit_slippage: f64,
    /// Hedge distance from the ATM strike as a fraction.
    #[serde(default = "default_hedge_offset")]
    pub hedge_offset: f64,
    /// Rolling window length in bars for trailing stops.
    #[serde(default = "default_trail_window")]
    pub trail_window: usize,
    #[serde(default = "default_lot_size")]
    pub lot_size: u32,
    pub exit_policy: ExitPolicyConfig,
}

impl StrategyConfig {
    /// Standard parameters with the given exit policy.
    pub fn new(exit_policy: ExitPolicyConfig) -> Self {
        Self {
            market_open: default_market_open(),
            entry_time: default_entry_time(),
            session_close: default_session_close(),
            exit_cutoff: default_exit_cutoff(),
            entry_slippage: default_slippage(),
            exit_slippage: default_slippage(),
            hedge_offset: default_hedge_offset(),
            trail_window: default_trail_window(),
            lot_size: default_lot_size(),
            exit_policy,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market_open >= self.entry_time {
            return Err(ConfigError::TimeOrder {
                earlier: "market_open",
                later: "entry_time",
            });
        }
        if self.entry_time > self.session_close {
            return Err(ConfigError::TimeOrder {
                earlier: "entry_time",
                later: "session_close",
            });
        }
        if self.session_close.overflowing_add_signed(Duration::minutes(1)).1 != 0 {
            return Err(ConfigError::InvalidParam {
                name: "session_close",
                reason: "must leave room for a one-minute bar before midnight".into(),
            });
        }
        if self.exit_cutoff <= self.market_open {
            return Err(ConfigError::TimeOrder {
                earlier: "market_open",
                later: "exit_cutoff",
            });
        }
        check_fraction("entry_slippage", self.entry_slippage)?;
        check_fraction("exit_slippage", self.exit_slippage)?;
        check_fraction("hedge_offset", self.hedge_offset)?;
        if let ExitPolicyConfig::IndependentTrail { buffer } = self.exit_policy {
            check_fraction("exit_policy.buffer", buffer)?;
        }
        if self.trail_window == 0 {
            return Err(ConfigError::InvalidParam {
                name: "trail_window",
                reason: "must be at least 1 bar".into(),
            });
        }
        if self.lot_size == 0 {
            return Err(ConfigError::InvalidParam {
                name: "lot_size",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Human-readable parameter list for reports.
    pub fn parameter_table(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Entry Time".to_string(), self.entry_time.to_string()),
            ("Market Open".to_string(), self.market_open.to_string()),
            ("Session Close".to_string(), self.session_close.to_string()),
            ("Exit Time".to_string(), self.exit_cutoff.to_string()),
            ("Entry Slippage".to_string(), format!("{}%", self.entry_slippage * 100.0)),
            ("Exit Slippage".to_string(), format!("{}%", self.exit_slippage * 100.0)),
            ("Hedge Distance".to_string(), format!("{}%", self.hedge_offset * 100.0)),
            ("Trail Window".to_string(), format!("{} bars", self.trail_window)),
            ("Lot Size".to_string(), self.lot_size.to_string()),
            ("Exit Policy".to_string(), self.exit_policy.name().to_string()),
        ];
        if let ExitPolicyConfig::IndependentTrail { buffer } = self.exit_policy {
            rows.push(("Trail Buffer".to_string(), format!("{}%", buffer * 100.0)));
        }
        rows
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&value) {
        return Err(ConfigError::InvalidParam {
            name,
            reason: format!("{value} is outside [0, 1)"),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{earlier} must be before {later}")]
    TimeOrder {
        earlier: &'static str,
        later: &'static str,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}
