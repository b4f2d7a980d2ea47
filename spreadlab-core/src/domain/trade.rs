//! Trade: one simulated overnight spread, entry to exit.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::instrument::{Direction, InstrumentType, Strike};

/// A completed two-leg trade.
///
/// Prices are after slippage. P&L figures already include the lot size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Dates ──
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,

    // ── Times ──
    pub entry_time: NaiveTime,
    /// Spread exit time. For independent exits this is the main leg's exit.
    pub exit_time: NaiveTime,
    /// Hedge exit time when the legs exit independently.
    #[serde(default)]
    pub hedge_exit_time: Option<NaiveTime>,

    // ── Contracts ──
    pub direction: Direction,
    pub instrument: InstrumentType,
    pub main_strike: Strike,
    pub hedge_strike: Strike,
    /// True when no strike existed on the hedge side and the hedge collapsed onto the main strike.
    #[serde(default)]
    pub hedge_degenerate: bool,

    // ── Underlying ──
    pub spot_open: f64,
    pub spot_at_entry: f64,
    pub movement_pct: f64,

    // ── Prices ──
    pub main_entry_price: f64,
    pub main_exit_price: f64,
    pub hedge_entry_price: f64,
    pub hedge_exit_price: f64,

    // ── PnL ──
    pub main_pnl: f64,
    pub hedge_pnl: f64,
    pub total_pnl: f64,
    pub main_pnl_pct: f64,
    pub hedge_pnl_pct: f64,
    pub total_pnl_pct: f64,

    // ── Traceability ──
    pub entry_reason: String,
    pub exit_reason: String,
    #[serde(default)]
    pub hedge_exit_reason: Option<String>,
    pub exit_policy: String,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.total_pnl > 0.0
    }

    /// Latest exit time over both legs.
    pub fn final_exit_time(&self) -> NaiveTime {
        match self.hedge_exit_time {
            Some(h) => h.max(self.exit_time),
            None => self.exit_time,
        }
    }
}

/// Percentage return of `pnl` on `capital`, zero when there is no capital at risk.
pub fn pct_of(pnl: f64, capital: f64) -> f64 {
    if capital > 0.0 {
        pnl / capital * 100.0
    } else {
        0.0
    }
}
