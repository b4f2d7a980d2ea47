//! Trading calendar: sorted trading dates with constant-time successor lookup.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::provider::{DataError, PriceSeriesProvider};

/// Chronological index of trading dates, built once per run.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
    index: HashMap<NaiveDate, usize>,
}

impl TradingCalendar {
    pub fn new(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        let index = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        Self { dates, index }
    }

    pub fn from_provider(provider: &dyn PriceSeriesProvider) -> Result<Self, DataError> {
        Ok(Self::new(provider.list_trading_dates()?))
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.index.contains_key(&date)
    }

    /// The trading date immediately after `date`, if both are in the calendar.
    pub fn next_trading_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let i = *self.index.get(&date)?;
        self.dates.get(i + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 9, day).unwrap()
    }

    #[test]
    fn sorts_and_dedups() {
        let cal = TradingCalendar::new(vec![d(5), d(4), d(5), d(7)]);
        assert_eq!(cal.dates(), &[d(4), d(5), d(7)]);
    }

    #[test]
    fn successor_skips_gaps_in_calendar_days() {
        let cal = TradingCalendar::new(vec![d(4), d(5), d(7)]);
        assert_eq!(cal.next_trading_date(d(5)), Some(d(7)));
    }

    #[test]
    fn last_and_unknown_dates_have_no_successor() {
        let cal = TradingCalendar::new(vec![d(4), d(5)]);
        assert_eq!(cal.next_trading_date(d(5)), None);
        assert_eq!(cal.next_trading_date(d(6)), None);
    }
}
