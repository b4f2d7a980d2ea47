//! Strategy components: the pieces the simulator composes for one trading date.
//!
//! - Direction classifier: reads the session move of the underlying
//! - Strike selector: picks the ATM main strike and the OTM hedge
//! - Exit engine: decides when each leg is closed on the exit morning

pub mod direction;
pub mod exit;
pub mod strikes;

pub use direction::{ClassificationError, DirectionClassifier, MarketMove};
pub use exit::{
    create_exit_policy, CoupledTrail, ExitError, ExitPolicy, ExitReason, IndependentTrail,
    LegExit, SpreadExit,
};
pub use strikes::{select_strikes, SelectionError, StrikeSelection};
