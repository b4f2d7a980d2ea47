use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Option strike price. Strikes are enumerated from the data, never computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strike(pub i64);

impl Strike {
    pub fn value(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Absolute distance to an arbitrary price level.
    pub fn distance_to(self, price: f64) -> f64 {
        (self.as_f64() - price).abs()
    }
}

impl fmt::Display for Strike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Put or call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    #[serde(rename = "PE")]
    Put,
    #[serde(rename = "CE")]
    Call,
}

impl InstrumentType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Put => "PE",
            Self::Call => "CE",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for InstrumentType {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PE" | "P" | "PUT" => Ok(Self::Put),
            "CE" | "C" | "CALL" => Ok(Self::Call),
            other => Err(InstrumentError::UnknownInstrument(other.to_string())),
        }
    }
}

/// Direction of the underlying between session open and the decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Up markets sell downside protection (puts); down markets sell calls.
    pub fn instrument_to_sell(self) -> InstrumentType {
        match self {
            Self::Up => InstrumentType::Put,
            Self::Down => InstrumentType::Call,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InstrumentError {
    #[error("unknown instrument type '{0}' (expected PE or CE)")]
    UnknownInstrument(String),
}
