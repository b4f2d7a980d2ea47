//! PriceBar: the fundamental market data unit.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::instrument::{InstrumentType, Strike};

/// One-minute OHLC bar for an underlying or a single option contract.
///
/// The calendar date is implied by the query that produced the bar; only the
/// time of day is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: NaiveTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// Build a bar, rejecting non-finite prices and inverted high/low.
    pub fn new(
        time: NaiveTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Result<Self, BarError> {
        let bar = Self { time, open, high, low, close };
        bar.validate()?;
        Ok(bar)
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    pub fn validate(&self) -> Result<(), BarError> {
        if self.is_void() {
            return Err(BarError::NonFinite { time: self.time });
        }
        if self.high < self.low {
            return Err(BarError::InvertedRange {
                time: self.time,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }
}

/// One row of an option price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionBar {
    pub strike: Strike,
    pub instrument: InstrumentType,
    pub expiry: NaiveDate,
    pub bar: PriceBar,
}

impl OptionBar {
    pub fn time(&self) -> NaiveTime {
        self.bar.time
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BarError {
    #[error("bar at {time} has a non-finite price")]
    NonFinite { time: NaiveTime },

    #[error("bar at {time} has high {high} below low {low}")]
    InvertedRange { time: NaiveTime, high: f64, low: f64 },
}

/// Last bar at or before `cutoff`, assuming `bars` is time-ordered.
pub fn last_at_or_before(bars: &[PriceBar], cutoff: NaiveTime) -> Option<&PriceBar> {
    bars.iter().rev().find(|b| b.time <= cutoff)
}

/// First bar at or after `start`, assuming `bars` is time-ordered.
pub fn first_at_or_after(bars: &[PriceBar], start: NaiveTime) -> Option<&PriceBar> {
    bars.iter().find(|b| b.time >= start)
}

/// Keep only bars at or before `cutoff`.
pub fn through(bars: &[PriceBar], cutoff: NaiveTime) -> Vec<PriceBar> {
    bars.iter().copied().filter(|b| b.time <= cutoff).collect()
}
