//! Slippage model: proportional, always adverse.
//!
//! - Sells fill at `raw * (1 - s)`
//! - Buys fill at `raw * (1 + s)`
//!
//! `s` is chosen by phase, so entry and exit can carry different costs.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// Action that opens a leg on `side`.
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Short => Self::Sell,
            Side::Long => Self::Buy,
        }
    }

    /// Action that closes a leg on `side`.
    pub fn closing(side: Side) -> Self {
        match side {
            Side::Short => Self::Buy,
            Side::Long => Self::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlippageModel {
    /// Fraction applied to entry fills (0.005 = 0.5%).
    pub entry: f64,
    /// Fraction applied to exit fills.
    pub exit: f64,
}

impl SlippageModel {
    pub fn new(entry: f64, exit: f64) -> Self {
        Self { entry, exit }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.entry_slippage, config.exit_slippage)
    }

    pub fn fraction(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Entry => self.entry,
            Phase::Exit => self.exit,
        }
    }

    pub fn adjusted_price(&self, raw: f64, phase: Phase, action: Action) -> f64 {
        let s = self.fraction(phase);
        match action {
            Action::Sell => raw * (1.0 - s),
            Action::Buy => raw * (1.0 + s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sells_receive_less_buys_pay_more() {
        let m = SlippageModel::new(0.005, 0.01);
        assert!((m.adjusted_price(100.0, Phase::Entry, Action::Sell) - 99.5).abs() < 1e-12);
        assert!((m.adjusted_price(100.0, Phase::Entry, Action::Buy) - 100.5).abs() < 1e-12);
        assert!((m.adjusted_price(100.0, Phase::Exit, Action::Sell) - 99.0).abs() < 1e-12);
        assert!((m.adjusted_price(100.0, Phase::Exit, Action::Buy) - 101.0).abs() < 1e-12);
    }

    #[test]
    fn zero_slippage_is_identity() {
        let m = SlippageModel::new(0.0, 0.0);
        assert_eq!(m.adjusted_price(42.0, Phase::Exit, Action::Buy), 42.0);
        assert_eq!(m.adjusted_price(42.0, Phase::Entry, Action::Sell), 42.0);
    }

    #[test]
    fn opening_and_closing_actions_mirror() {
        assert_eq!(Action::opening(Side::Short), Action::Sell);
        assert_eq!(Action::closing(Side::Short), Action::Buy);
        assert_eq!(Action::opening(Side::Long), Action::Buy);
        assert_eq!(Action::closing(Side::Long), Action::Sell);
    }
}
