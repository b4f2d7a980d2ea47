//! Deterministic synthetic market: an index random walk with a weekly option chain.
//!
//! Used by the `--synthetic` mode, tests and benchmarks. The same seed always
//! produces the same provider.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::memory::InMemoryProvider;
use crate::domain::{InstrumentType, PriceBar, Strike};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMarket {
    pub seed: u64,
    pub start: NaiveDate,
    /// Number of weekdays to generate.
    pub days: usize,
    pub base_spot: f64,
    pub strike_step: i64,
    /// Strikes listed on each side of the day's opening ATM.
    pub strikes_per_side: i64,
    /// Per-minute volatility of the underlying as a fraction.
    pub minute_vol: f64,
    pub session_open: NaiveTime,
    pub session_close: NaiveTime,
}

impl Default for SyntheticMarket {
    fn default() -> Self {
        Self {
            seed: 42,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            days: 20,
            base_spot: 20_000.0,
            strike_step: 50,
            strikes_per_side: 12,
            minute_vol: 0.0006,
            session_open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            session_close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Weekly expiry: the first Thursday on or after `date`.
fn weekly_expiry(date: NaiveDate) -> NaiveDate {
    let ahead = (Weekday::Thu.num_days_from_monday() + 7
        - date.weekday().num_days_from_monday())
        % 7;
    date + Duration::days(i64::from(ahead))
}

/// Option premium as intrinsic value plus a time value decaying with moneyness.
fn premium(spot: f64, strike: f64, instrument: InstrumentType) -> f64 {
    let intrinsic = match instrument {
        InstrumentType::Call => (spot - strike).max(0.0),
        InstrumentType::Put => (strike - spot).max(0.0),
    };
    let width = 0.02 * spot;
    let time_value = 0.006 * spot * (-(spot - strike).abs() / width).exp();
    intrinsic + time_value
}

fn option_bar(spot: &PriceBar, strike: f64, instrument: InstrumentType) -> PriceBar {
    let o = premium(spot.open, strike, instrument);
    let h = premium(spot.high, strike, instrument);
    let l = premium(spot.low, strike, instrument);
    let c = premium(spot.close, strike, instrument);
    PriceBar {
        time: spot.time,
        open: o,
        high: o.max(h).max(l).max(c),
        low: o.min(h).min(l).min(c),
        close: c,
    }
}

impl SyntheticMarket {
    pub fn trading_dates(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .take(self.days)
            .collect()
    }

    fn session(&self, rng: &mut StdRng, open_spot: f64) -> Vec<PriceBar> {
        let mut bars = Vec::new();
        let mut last = open_spot;
        let mut time = self.session_open;
        while time <= self.session_close {
            let open = last;
            let shock: f64 = (0..4).map(|_| rng.gen_range(-1.0..1.0)).sum::<f64>() * 0.5;
            let close = open * (1.0 + self.minute_vol * shock);
            let wick = open * self.minute_vol * rng.gen_range(0.0..0.5);
            bars.push(PriceBar {
                time,
                open,
                high: open.max(close) + wick,
                low: open.min(close) - wick,
                close,
            });
            last = close;
            let (next, wrapped) = time.overflowing_add_signed(Duration::minutes(1));
            if wrapped != 0 {
                break;
            }
            time = next;
        }
        bars
    }

    pub fn build(&self) -> InMemoryProvider {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut provider = InMemoryProvider::new();
        let mut spot = self.base_spot;
        let step = self.strike_step.max(1);

        for date in self.trading_dates() {
            let gap: f64 = rng.gen_range(-0.004..0.004);
            let underlying = self.session(&mut rng, spot * (1.0 + gap));
            let Some(first) = underlying.first() else {
                continue;
            };
            let atm = (first.open / step as f64).round() as i64 * step;
            let expiry = weekly_expiry(date);

            for k in -self.strikes_per_side..=self.strikes_per_side {
                let strike = atm + k * step;
                for instrument in [InstrumentType::Put, InstrumentType::Call] {
                    let bars: Vec<PriceBar> = underlying
                        .iter()
                        .map(|b| option_bar(b, strike as f64, instrument))
                        .collect();
                    provider.add_option_series(date, Strike(strike), instrument, expiry, &bars);
                }
            }

            if let Some(last) = underlying.last() {
                spot = last.close;
            }
            provider.set_underlying(date, underlying);
        }
        provider
    }
}
