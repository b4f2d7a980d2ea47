//! SpreadLab Core: overnight option-spread engine.
//!
//! This crate contains everything needed to simulate one trade per date:
//! - Domain types (bars, strikes, instruments, positions, trades)
//! - Price series providers (SQLite, in-memory, synthetic) and the trading calendar
//! - Direction classifier, strike selector and exit policies
//! - Slippage model
//! - Trade simulator
//!
//! Run orchestration and reporting live in `spreadlab-runner`.

pub mod components;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;

pub use config::{ExitPolicyConfig, StrategyConfig};
pub use engine::{SkipReason, TradeSimulator};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across rayon workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::OptionBar>();
        require_sync::<domain::OptionBar>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();

        require_send::<config::StrategyConfig>();
        require_sync::<config::StrategyConfig>();

        require_send::<data::SqliteProvider>();
        require_sync::<data::SqliteProvider>();
        require_send::<data::InMemoryProvider>();
        require_sync::<data::InMemoryProvider>();
        require_send::<data::TradingCalendar>();
        require_sync::<data::TradingCalendar>();

        require_send::<components::CoupledTrail>();
        require_sync::<components::CoupledTrail>();
        require_send::<components::IndependentTrail>();
        require_sync::<components::IndependentTrail>();

        require_sync::<engine::TradeSimulator<'static>>();
        require_send::<engine::SkipReason>();
        require_sync::<engine::SkipReason>();
    }

    /// The exit policy sees only the exit-morning series of the two legs, never
    /// entry prices or the calendar.
    #[test]
    fn exit_policy_trait_takes_only_leg_series() {
        fn _check_trait_object_builds(
            policy: &dyn components::ExitPolicy,
            main: &[domain::PriceBar],
            hedge: &[domain::PriceBar],
        ) -> Result<components::SpreadExit, components::ExitError> {
            policy.evaluate(main, hedge)
        }
    }
}
