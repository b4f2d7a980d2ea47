//! Strike selection: ATM main leg plus an OTM hedge on the protective side.
//!
//! Up sessions sell a put and buy a lower put; Down sessions sell a call and
//! buy a higher call. The hedge is the available strike nearest to
//! `ATM * (1 -/+ offset)` on the correct side of ATM.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{Direction, InstrumentType, Strike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeSelection {
    pub atm: Strike,
    pub hedge: Strike,
    pub instrument: InstrumentType,
    /// No strike existed on the hedge side, so the hedge sits on the ATM strike.
    pub degenerate: bool,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionError {
    #[error("no strikes available")]
    NoStrikes,

    #[error("spot price {0} is not finite")]
    InvalidSpot(f64),
}

/// Strike nearest to `target`; ties go to the lower strike.
fn nearest(strikes: impl Iterator<Item = Strike>, target: f64) -> Option<Strike> {
    strikes.min_by(|a, b| {
        a.distance_to(target)
            .total_cmp(&b.distance_to(target))
            .then(a.cmp(b))
    })
}

pub fn select_strikes(
    spot: f64,
    strikes: &[Strike],
    direction: Direction,
    hedge_offset: f64,
) -> Result<StrikeSelection, SelectionError> {
    if !spot.is_finite() {
        return Err(SelectionError::InvalidSpot(spot));
    }
    let atm = nearest(strikes.iter().copied(), spot).ok_or(SelectionError::NoStrikes)?;
    let instrument = direction.instrument_to_sell();

    let (target, hedge) = match instrument {
        InstrumentType::Put => {
            let target = atm.as_f64() * (1.0 - hedge_offset);
            (target, nearest(strikes.iter().copied().filter(|s| *s < atm), target))
        }
        InstrumentType::Call => {
            let target = atm.as_f64() * (1.0 + hedge_offset);
            (target, nearest(strikes.iter().copied().filter(|s| *s > atm), target))
        }
    };

    Ok(match hedge {
        Some(hedge) => StrikeSelection {
            atm,
            hedge,
            instrument,
            degenerate: false,
        },
        None => {
            warn!(%atm, %instrument, target, "no hedge candidate beyond ATM, hedging on the ATM strike");
            StrikeSelection {
                atm,
                hedge: atm,
                instrument,
                degenerate: true,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strikes(values: &[i64]) -> Vec<Strike> {
        values.iter().copied().map(Strike).collect()
    }

    #[test]
    fn up_sells_put_with_lower_hedge() {
        let sel = select_strikes(102.0, &strikes(&[95, 100, 105, 110]), Direction::Up, 0.02).unwrap();
        assert_eq!(sel.atm, Strike(100));
        assert_eq!(sel.instrument, InstrumentType::Put);
        // target 98: 95 is the only candidate below 100
        assert_eq!(sel.hedge, Strike(95));
        assert!(!sel.degenerate);
    }

    #[test]
    fn down_sells_call_with_higher_hedge() {
        let sel = select_strikes(
            19_990.0,
            &strikes(&[19_800, 19_900, 20_000, 20_100, 20_400, 20_500]),
            Direction::Down,
            0.02,
        )
        .unwrap();
        assert_eq!(sel.atm, Strike(20_000));
        assert_eq!(sel.instrument, InstrumentType::Call);
        // target 20_400 exactly
        assert_eq!(sel.hedge, Strike(20_400));
    }

    #[test]
    fn atm_tie_picks_lower_strike() {
        let sel = select_strikes(102.5, &strikes(&[100, 105, 110]), Direction::Down, 0.02).unwrap();
        assert_eq!(sel.atm, Strike(100));
    }

    #[test]
    fn hedge_tie_picks_lower_strike() {
        // ATM 100, CE target 102; 101 and 103 equidistant
        let sel = select_strikes(100.0, &strikes(&[100, 101, 103]), Direction::Down, 0.02).unwrap();
        assert_eq!(sel.hedge, Strike(101));
    }

    #[test]
    fn no_candidate_is_degenerate() {
        let sel = select_strikes(101.0, &strikes(&[100, 105]), Direction::Up, 0.02).unwrap();
        assert_eq!(sel.atm, Strike(100));
        assert_eq!(sel.hedge, Strike(100));
        assert!(sel.degenerate);
    }

    #[test]
    fn empty_strikes_fail() {
        assert_eq!(
            select_strikes(100.0, &[], Direction::Up, 0.02),
            Err(SelectionError::NoStrikes)
        );
    }
}
