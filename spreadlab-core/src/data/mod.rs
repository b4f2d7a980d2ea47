//! Price-series access: provider trait, storage backends and the trading calendar.

pub mod calendar;
pub mod memory;
pub mod provider;
pub mod sqlite;
pub mod synthetic;

pub use calendar::TradingCalendar;
pub use memory::InMemoryProvider;
pub use provider::{price_bars, DataError, OptionFilter, PriceSeriesProvider};
pub use sqlite::SqliteProvider;
pub use synthetic::SyntheticMarket;
