//! Domain types for SpreadLab

pub mod bar;
pub mod instrument;
pub mod position;
pub mod trade;

pub use bar::{BarError, OptionBar, PriceBar};
pub use instrument::{Direction, InstrumentError, InstrumentType, Strike};
pub use position::{LegRole, Position, Side};
pub use trade::Trade;
