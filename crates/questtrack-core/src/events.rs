//! Semantic events derived from stable-state transitions.

use serde::Serialize;

/// What happened. Payload fields are part of the event identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Death,
    UpAWarp,
    TriforceInferred { level: u8 },
    GameComplete,
    StaircaseItemAcquired { item: String, dungeon_level: u8 },
}

/// An emitted event. Immutable once created; `(entity, kind, timestamp_ms)`
/// is a stable identity downstream consumers can deduplicate on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub entity: String,
    pub frame_index: u64,
    pub timestamp_ms: u64,
    /// Name of the tracker that produced the event.
    pub source: &'static str,
}
