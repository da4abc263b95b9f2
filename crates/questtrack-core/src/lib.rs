//! Questtrack core: the game-state model, the debounce layer and the
//! event-derivation state machines.
//!
//! This crate is deliberately free of image dependencies. The vision layer
//! (questtrack-cv) produces [`RawFrameObservation`]s; everything from the
//! stability gate down is pure state-machine logic that can be driven and
//! tested without a single pixel.

pub mod config;
pub mod coordinator;
pub mod events;
pub mod stability;
pub mod state;
pub mod trackers;

// Re-export commonly used types
pub use config::{StabilityConfig, TrackerConfig};
pub use coordinator::{Anomaly, Coordinator};
pub use events::{EventKind, GameEvent};
pub use stability::{PendingField, PendingSnapshot, StabilityGate};
pub use state::{
    FloorItem, Hearts, KeysReading, MapPosition, RawFrameObservation, ScreenType, StableGameState,
    TriforceReading,
};
pub use trackers::TriforceLedger;
