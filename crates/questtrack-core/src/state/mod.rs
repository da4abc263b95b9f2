//! Game state data model: raw per-frame observations and the debounced
//! canonical state they are promoted into.

pub mod observation;
pub mod screen;
pub mod stable;

pub use observation::{FloorItem, Hearts, KeysReading, RawFrameObservation, TriforceReading};
pub use screen::{MapPosition, ScreenType};
pub use stable::StableGameState;
