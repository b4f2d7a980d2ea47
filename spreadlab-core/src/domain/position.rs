//! Position: one open leg of the spread.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::instrument::{InstrumentType, Strike};

/// Which side of the market a leg is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Short,
    Long,
}

/// The role a leg plays in the spread.
///
/// The main leg is always sold, the hedge always bought, whatever the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegRole {
    Main,
    Hedge,
}

impl LegRole {
    pub fn side(self) -> Side {
        match self {
            Self::Main => Side::Short,
            Self::Hedge => Side::Long,
        }
    }
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Hedge => f.write_str("hedge"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub role: LegRole,
    pub strike: Strike,
    pub instrument: InstrumentType,
    pub expiry: NaiveDate,
    pub entry_time: NaiveTime,
    /// Entry price after slippage.
    pub entry_price: f64,
}

impl Position {
    pub fn side(&self) -> Side {
        self.role.side()
    }

    /// P&L per unit for an exit at `exit_price` (already slipped).
    pub fn pnl_per_unit(&self, exit_price: f64) -> f64 {
        match self.side() {
            Side::Short => self.entry_price - exit_price,
            Side::Long => exit_price - self.entry_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(role: LegRole) -> Position {
        Position {
            role,
            strike: Strike(100),
            instrument: InstrumentType::Put,
            expiry: NaiveDate::from_ymd_opt(2023, 9, 7).unwrap(),
            entry_time: NaiveTime::from_hms_opt(15, 25, 0).unwrap(),
            entry_price: 10.0,
        }
    }

    #[test]
    fn main_is_short_hedge_is_long() {
        assert_eq!(leg(LegRole::Main).side(), Side::Short);
        assert_eq!(leg(LegRole::Hedge).side(), Side::Long);
    }

    #[test]
    fn pnl_sign_follows_side() {
        assert_eq!(leg(LegRole::Main).pnl_per_unit(8.0), 2.0);
        assert_eq!(leg(LegRole::Hedge).pnl_per_unit(8.0), -2.0);
    }
}
