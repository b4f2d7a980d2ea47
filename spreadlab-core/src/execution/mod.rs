//! Execution: turns raw option closes into fill prices.

pub mod slippage;

pub use slippage::{Action, Phase, SlippageModel};
