//! In-memory provider for tests, synthetic runs and benchmarks.

use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, BTreeSet};

use super::provider::{retain_nearest_expiry, DataError, OptionFilter, PriceSeriesProvider};
use crate::domain::{InstrumentType, OptionBar, PriceBar, Strike};

#[derive(Debug, Clone, Default)]
struct DaySeries {
    underlying: Vec<PriceBar>,
    options: Vec<OptionBar>,
}

/// Provider backed by series held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    days: BTreeMap<NaiveDate, DaySeries>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trading date with no series yet.
    pub fn add_date(&mut self, date: NaiveDate) -> &mut Self {
        self.days.entry(date).or_default();
        self
    }

    pub fn set_underlying(&mut self, date: NaiveDate, mut bars: Vec<PriceBar>) -> &mut Self {
        bars.sort_by_key(|b| b.time);
        self.days.entry(date).or_default().underlying = bars;
        self
    }

    /// Append one contract's bars for `date`.
    pub fn add_option_series(
        &mut self,
        date: NaiveDate,
        strike: Strike,
        instrument: InstrumentType,
        expiry: NaiveDate,
        bars: &[PriceBar],
    ) -> &mut Self {
        let day = self.days.entry(date).or_default();
        day.options.extend(bars.iter().map(|bar| OptionBar {
            strike,
            instrument,
            expiry,
            bar: *bar,
        }));
        day.options.sort_by_key(|r| (r.bar.time, r.strike));
        self
    }

    fn day(&self, date: NaiveDate) -> Result<&DaySeries, DataError> {
        self.days.get(&date).ok_or(DataError::DateNotFound { date })
    }
}

impl PriceSeriesProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn list_trading_dates(&self) -> Result<Vec<NaiveDate>, DataError> {
        Ok(self.days.keys().copied().collect())
    }

    fn underlying_series(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<PriceBar>, DataError> {
        Ok(self
            .day(date)?
            .underlying
            .iter()
            .copied()
            .filter(|b| b.time >= start && b.time <= end)
            .collect())
    }

    fn option_series(
        &self,
        date: NaiveDate,
        filter: &OptionFilter,
    ) -> Result<Vec<OptionBar>, DataError> {
        let mut rows: Vec<OptionBar> = self
            .day(date)?
            .options
            .iter()
            .copied()
            .filter(|r| filter.matches(r))
            .collect();
        if filter.is_single_contract() {
            retain_nearest_expiry(&mut rows);
        }
        Ok(rows)
    }

    fn list_strikes(&self, date: NaiveDate, expiry: NaiveDate) -> Result<Vec<Strike>, DataError> {
        let strikes: BTreeSet<Strike> = self
            .day(date)?
            .options
            .iter()
            .filter(|r| r.expiry == expiry)
            .map(|r| r.strike)
            .collect();
        Ok(strikes.into_iter().collect())
    }
}
