//! Coupled trail: both legs watched in lockstep against their rolling highs.
//!
//! At each timestamp where both legs traded, a leg triggers when its close is at
//! or above the rolling maximum of its highs. Either trigger closes the whole
//! spread at that bar; the main leg is checked first. Without a trigger each leg
//! is closed at its last bar before the cutoff.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveTime;

use super::rolling::rolling_high;
use super::{require_bars, ExitError, ExitPolicy, ExitReason, LegExit, SpreadExit};
use crate::domain::{LegRole, PriceBar};

#[derive(Debug, Clone)]
pub struct CoupledTrail {
    pub window: usize,
}

impl CoupledTrail {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }
}

/// First bar index per timestamp; later duplicates are ignored.
fn index_by_time(bars: &[PriceBar]) -> HashMap<NaiveTime, usize> {
    let mut at = HashMap::with_capacity(bars.len());
    for (i, b) in bars.iter().enumerate() {
        at.entry(b.time).or_insert(i);
    }
    at
}

impl ExitPolicy for CoupledTrail {
    fn name(&self) -> &str {
        "coupled_trail"
    }

    fn evaluate(&self, main: &[PriceBar], hedge: &[PriceBar]) -> Result<SpreadExit, ExitError> {
        require_bars(main, LegRole::Main)?;
        require_bars(hedge, LegRole::Hedge)?;

        let main_high = rolling_high(main, self.window);
        let hedge_high = rolling_high(hedge, self.window);
        let main_at = index_by_time(main);
        let hedge_at = index_by_time(hedge);

        let timeline: BTreeSet<NaiveTime> = main.iter().chain(hedge).map(|b| b.time).collect();
        for t in timeline {
            let (Some(&mi), Some(&hi)) = (main_at.get(&t), hedge_at.get(&t)) else {
                continue;
            };
            let reason = if main[mi].close >= main_high[mi] {
                ExitReason::MainTrailStop
            } else if hedge[hi].close >= hedge_high[hi] {
                ExitReason::HedgeTrailStop
            } else {
                continue;
            };
            return Ok(SpreadExit {
                main: LegExit::at(&main[mi], reason),
                hedge: LegExit::at(&hedge[hi], reason),
                coupled: true,
            });
        }

        // require_bars guarantees both are non-empty
        let (Some(main_last), Some(hedge_last)) = (main.last(), hedge.last()) else {
            return Err(ExitError::NoData { leg: LegRole::Main });
        };
        Ok(SpreadExit {
            main: LegExit::at(main_last, ExitReason::TimeExit),
            hedge: LegExit::at(hedge_last, ExitReason::TimeExit),
            coupled: true,
        })
    }
}
