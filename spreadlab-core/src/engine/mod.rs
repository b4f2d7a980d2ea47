//! Trade simulation: composes the components into one trade per trading date.

pub mod simulator;

pub use simulator::{ContractPlan, MissingData, SkipReason, TradeSimulator};
