//! Price-series provider trait and structured error types.
//!
//! The `PriceSeriesProvider` trait abstracts over storage backends (SQLite
//! date-partitioned tables, in-memory fixtures) so the simulator never knows
//! where bars come from and tests can run without a database.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::domain::{BarError, InstrumentType, OptionBar, PriceBar, Strike};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data stored for {date}")]
    DateNotFound { date: NaiveDate },

    #[error("malformed row in {context}: {detail}")]
    Malformed { context: String, detail: String },

    #[error("invalid bar in {context}: {source}")]
    InvalidBar {
        context: String,
        #[source]
        source: BarError,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Optional filters on an option-series query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionFilter {
    pub strike: Option<Strike>,
    pub instrument: Option<InstrumentType>,
}

impl OptionFilter {
    /// Every contract traded on the date.
    pub fn all() -> Self {
        Self::default()
    }

    /// A single contract line; results are narrowed to the nearest expiry.
    pub fn contract(strike: Strike, instrument: InstrumentType) -> Self {
        Self {
            strike: Some(strike),
            instrument: Some(instrument),
        }
    }

    pub fn is_single_contract(&self) -> bool {
        self.strike.is_some() && self.instrument.is_some()
    }

    pub fn matches(&self, row: &OptionBar) -> bool {
        self.strike.map_or(true, |s| s == row.strike)
            && self.instrument.map_or(true, |i| i == row.instrument)
    }
}

/// Storage backend for minute bars.
///
/// Implementations must return series ordered by time (option series by
/// time, then strike) and must reject malformed rows rather than pass NaN on.
pub trait PriceSeriesProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Every trading date available, in chronological order.
    fn list_trading_dates(&self) -> Result<Vec<NaiveDate>, DataError>;

    /// Underlying bars for `date` with `start <= time <= end`.
    fn underlying_series(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<PriceBar>, DataError>;

    /// Option rows for `date`. Single-contract filters return the nearest expiry only.
    fn option_series(
        &self,
        date: NaiveDate,
        filter: &OptionFilter,
    ) -> Result<Vec<OptionBar>, DataError>;

    /// Distinct strikes quoted for `expiry` on `date`, ascending.
    fn list_strikes(&self, date: NaiveDate, expiry: NaiveDate) -> Result<Vec<Strike>, DataError>;
}

/// Drop every row whose expiry is later than the earliest one present.
pub fn retain_nearest_expiry(rows: &mut Vec<OptionBar>) {
    if let Some(nearest) = rows.iter().map(|r| r.expiry).min() {
        rows.retain(|r| r.expiry == nearest);
    }
}

/// Strip option rows down to their price bars.
pub fn price_bars(rows: &[OptionBar]) -> Vec<PriceBar> {
    rows.iter().map(|r| r.bar).collect()
}
