//! Independent trail: each leg trails on its own series with a percentage buffer.
//!
//! Short (main):  stop = rolling_min(low)  * (1 + buffer), exit when close > stop.
//! Long (hedge):  stop = rolling_max(high) * (1 - buffer), exit when close < stop.
//!
//! A leg cannot trigger before its `WARMUP_BARS`-th bar, whatever the rolling
//! window; earlier windows are partial. Untriggered legs close at their last
//! bar before the cutoff.

use super::rolling::{rolling_high, rolling_low};
use super::{require_bars, ExitError, ExitPolicy, ExitReason, LegExit, SpreadExit};
use crate::domain::{LegRole, PriceBar, Side};

/// Bars a leg must have observed before its stop can fire.
pub const WARMUP_BARS: usize = 3;

#[derive(Debug, Clone)]
pub struct IndependentTrail {
    pub window: usize,
    /// Stop distance as a fraction of the rolling extreme (0.05 = 5%).
    pub buffer: f64,
}

impl IndependentTrail {
    pub fn new(window: usize, buffer: f64) -> Self {
        Self {
            window: window.max(1),
            buffer,
        }
    }

    fn leg_exit(&self, bars: &[PriceBar], role: LegRole) -> Result<LegExit, ExitError> {
        require_bars(bars, role)?;
        let skip = WARMUP_BARS - 1;
        let triggered: Option<&PriceBar> = match role.side() {
            Side::Short => {
                let lows = rolling_low(bars, self.window);
                bars.iter()
                    .zip(lows)
                    .skip(skip)
                    .find(|(bar, low)| bar.close > low * (1.0 + self.buffer))
                    .map(|(bar, _)| bar)
            }
            Side::Long => {
                let highs = rolling_high(bars, self.window);
                bars.iter()
                    .zip(highs)
                    .skip(skip)
                    .find(|(bar, high)| bar.close < high * (1.0 - self.buffer))
                    .map(|(bar, _)| bar)
            }
        };

        if let Some(bar) = triggered {
            return Ok(LegExit::at(bar, ExitReason::TrailStopHit));
        }
        bars.last()
            .map(|bar| LegExit::at(bar, ExitReason::TimeExit))
            .ok_or(ExitError::NoData { leg: role })
    }
}

impl ExitPolicy for IndependentTrail {
    fn name(&self) -> &str {
        "independent_trail"
    }

    fn evaluate(&self, main: &[PriceBar], hedge: &[PriceBar]) -> Result<SpreadExit, ExitError> {
        Ok(SpreadExit {
            main: self.leg_exit(main, LegRole::Main)?,
            hedge: self.leg_exit(hedge, LegRole::Hedge)?,
            coupled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(9, m, 0).unwrap()
    }

    fn flat(m: u32, price: f64) -> PriceBar {
        PriceBar::new(t(m), price, price, price, price).unwrap()
    }

    fn policy() -> IndependentTrail {
        IndependentTrail::new(3, 0.05)
    }

    #[test]
    fn short_leg_stops_on_rise_above_buffer() {
        // min low 10 -> stop 10.5; 11 at the third bar triggers
        let main = vec![flat(15, 10.0), flat(16, 10.2), flat(17, 11.0), flat(18, 12.0)];
        let hedge = vec![flat(15, 5.0), flat(16, 5.0), flat(17, 5.0)];
        let exit = policy().evaluate(&main, &hedge).unwrap();
        assert_eq!(exit.main.reason, ExitReason::TrailStopHit);
        assert_eq!(exit.main.time, t(17));
        assert_eq!(exit.main.price, 11.0);
        assert_eq!(exit.hedge.reason, ExitReason::TimeExit);
        assert!(!exit.coupled);
    }

    #[test]
    fn long_leg_stops_on_drop_below_buffer() {
        // max high 10 -> stop 9.5; 9 at the fourth bar triggers
        let main = vec![flat(15, 20.0)];
        let hedge = vec![flat(15, 10.0), flat(16, 9.8), flat(17, 9.7), flat(18, 9.0)];
        let exit = policy().evaluate(&main, &hedge).unwrap();
        assert_eq!(exit.hedge.reason, ExitReason::TrailStopHit);
        assert_eq!(exit.hedge.time, t(18));
        assert_eq!(exit.main.reason, ExitReason::TimeExit);
    }

    #[test]
    fn never_triggers_before_third_bar() {
        // second bar is far above the stop but only two bars have been observed
        let main = vec![flat(15, 10.0), flat(16, 20.0)];
        let hedge = vec![flat(15, 10.0), flat(16, 1.0)];
        let exit = policy().evaluate(&main, &hedge).unwrap();
        assert_eq!(exit.main.reason, ExitReason::TimeExit);
        assert_eq!(exit.hedge.reason, ExitReason::TimeExit);
        assert_eq!(exit.main.price, 20.0);
    }

    #[test]
    fn warmup_does_not_follow_the_window() {
        // window 1 and 2: a breach on bar 2 is still ignored
        for window in [1, 2] {
            let main = vec![flat(15, 10.0), flat(16, 20.0), flat(17, 20.0)];
            let hedge = vec![flat(15, 5.0), flat(16, 5.0), flat(17, 5.0)];
            let exit = IndependentTrail::new(window, 0.05).evaluate(&main, &hedge).unwrap();
            assert_eq!(exit.main.reason, ExitReason::TimeExit, "window {window}");
            assert_eq!(exit.main.time, t(17));
        }

        // window 5: a breach on bar 3 fires against the partial window
        let main = vec![flat(15, 10.0), flat(16, 10.0), flat(17, 20.0), flat(18, 9.0), flat(19, 9.0)];
        let hedge = vec![flat(15, 5.0), flat(16, 5.0), flat(17, 5.0)];
        let exit = IndependentTrail::new(5, 0.05).evaluate(&main, &hedge).unwrap();
        assert_eq!(exit.main.reason, ExitReason::TrailStopHit);
        assert_eq!(exit.main.time, t(17));
        assert_eq!(exit.main.price, 20.0);
    }

    #[test]
    fn legs_exit_at_their_own_times() {
        let main = vec![flat(15, 10.0), flat(16, 10.0), flat(17, 12.0), flat(18, 12.0)];
        let hedge = vec![flat(15, 10.0), flat(16, 10.0), flat(17, 10.0), flat(20, 8.0)];
        let exit = policy().evaluate(&main, &hedge).unwrap();
        assert_eq!(exit.main.time, t(17));
        assert_eq!(exit.hedge.time, t(20));
        assert_eq!(exit.exit_time(), t(20));
    }

    #[test]
    fn empty_leg_is_no_data() {
        assert_eq!(
            policy().evaluate(&[flat(15, 1.0)], &[]),
            Err(ExitError::NoData { leg: LegRole::Hedge })
        );
    }
}
