//! Market direction: open-to-decision move of the underlying.
//!
//! open price     = close of the first bar at or after `market_open`
//! decision price = close of the last bar at or before `entry_time`
//! movement       = (decision - open) / open
//!
//! Strictly positive movement is `Up`; zero or negative is `Down`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::bar::{first_at_or_after, last_at_or_before};
use crate::domain::{Direction, PriceBar};

/// Result of classifying one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketMove {
    pub open_price: f64,
    pub decision_price: f64,
    /// Fractional move (0.02 = +2%).
    pub movement: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassificationError {
    #[error("underlying series is empty")]
    EmptySeries,

    #[error("no underlying bar at or after session open {0}")]
    NoOpenBar(NaiveTime),

    #[error("no underlying bar at or before decision time {0}")]
    NoDecisionBar(NaiveTime),

    #[error("open price {0} is not positive")]
    NonPositiveOpen(f64),
}

/// Reads the session direction from the underlying series.
#[derive(Debug, Clone, Copy)]
pub struct DirectionClassifier {
    pub market_open: NaiveTime,
    pub decision_time: NaiveTime,
}

impl DirectionClassifier {
    pub fn new(market_open: NaiveTime, decision_time: NaiveTime) -> Self {
        Self { market_open, decision_time }
    }

    pub fn classify(&self, bars: &[PriceBar]) -> Result<MarketMove, ClassificationError> {
        if bars.is_empty() {
            return Err(ClassificationError::EmptySeries);
        }
        let open_bar = first_at_or_after(bars, self.market_open)
            .ok_or(ClassificationError::NoOpenBar(self.market_open))?;
        let decision_bar = last_at_or_before(bars, self.decision_time)
            .ok_or(ClassificationError::NoDecisionBar(self.decision_time))?;

        let open_price = open_bar.close;
        if open_price <= 0.0 {
            return Err(ClassificationError::NonPositiveOpen(open_price));
        }
        let decision_price = decision_bar.close;
        let movement = (decision_price - open_price) / open_price;
        let direction = if movement > 0.0 { Direction::Up } else { Direction::Down };

        Ok(MarketMove {
            open_price,
            decision_price,
            movement,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn bar(time: NaiveTime, close: f64) -> PriceBar {
        PriceBar::new(time, close, close, close, close).unwrap()
    }

    fn classifier() -> DirectionClassifier {
        DirectionClassifier::new(t(9, 15), t(15, 25))
    }

    #[test]
    fn rise_is_up() {
        let bars = vec![bar(t(9, 15), 100.0), bar(t(12, 0), 99.0), bar(t(15, 25), 102.0)];
        let mv = classifier().classify(&bars).unwrap();
        assert_eq!(mv.direction, Direction::Up);
        assert!((mv.movement - 0.02).abs() < 1e-12);
        assert_eq!(mv.decision_price, 102.0);
    }

    #[test]
    fn flat_session_is_down() {
        let bars = vec![bar(t(9, 15), 100.0), bar(t(15, 25), 100.0)];
        assert_eq!(classifier().classify(&bars).unwrap().direction, Direction::Down);
    }

    #[test]
    fn uses_last_bar_before_decision_time() {
        let bars = vec![bar(t(9, 15), 100.0), bar(t(15, 20), 98.0), bar(t(15, 29), 150.0)];
        let mv = classifier().classify(&bars).unwrap();
        assert_eq!(mv.decision_price, 98.0);
        assert_eq!(mv.direction, Direction::Down);
    }

    #[test]
    fn skips_pre_open_bars() {
        let bars = vec![bar(t(9, 10), 50.0), bar(t(9, 16), 100.0), bar(t(15, 25), 101.0)];
        assert_eq!(classifier().classify(&bars).unwrap().open_price, 100.0);
    }

    #[test]
    fn failures() {
        assert_eq!(classifier().classify(&[]), Err(ClassificationError::EmptySeries));
        let late_only = vec![bar(t(15, 28), 100.0)];
        assert_eq!(
            classifier().classify(&late_only),
            Err(ClassificationError::NoDecisionBar(t(15, 25)))
        );
        let early_only = vec![bar(t(9, 0), 100.0)];
        assert_eq!(
            classifier().classify(&early_only),
            Err(ClassificationError::NoOpenBar(t(9, 15)))
        );
    }
}
