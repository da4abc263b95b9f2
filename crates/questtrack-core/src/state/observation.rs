use serde::{Deserialize, Serialize};

use super::screen::{MapPosition, ScreenType};

/// Heart meter reading: filled hearts, total containers, and whether the
/// last filled heart is a half heart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hearts {
    pub current: u8,
    pub max: u8,
    pub half: bool,
}

impl Hearts {
    pub fn new(current: u8, max: u8, half: bool) -> Self {
        Self { current, max, half }
    }
}

/// Key counter reading. The counter region either shows a digit count or a
/// letter glyph meaning the master key has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeysReading {
    Count(u8),
    MasterKey,
}

/// Subscreen triforce reading: piece count from bright-cluster analysis
/// plus an 8-slot occupancy bitset (bit N = piece from dungeon N+1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriforceReading {
    pub count: u8,
    pub bits: u8,
}

/// A detected item lying in the play area.
///
/// Equality is by label and tile cell, not by exact pixel or score: two
/// detections of the same sprite that wobble by a pixel between frames must
/// compare equal or the stability gate would never see agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorItem {
    pub label: String,
    /// Top-left of the detection in play-area pixels.
    pub x: u32,
    pub y: u32,
    pub score: f64,
}

impl FloorItem {
    pub fn new(label: impl Into<String>, x: u32, y: u32, score: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            score,
        }
    }

    /// 8x8 tile cell containing the detection's top-left corner.
    pub fn tile(&self) -> (u32, u32) {
        (self.x / 8, self.y / 8)
    }
}

impl PartialEq for FloorItem {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.tile() == other.tile()
    }
}

/// Everything read off a single frame, before any debouncing.
///
/// Every field is optional: `None` means the reader could not produce a
/// confident value this frame (occlusion, compression, wrong screen), and
/// the stability gate ignores it entirely. Fields whose *emptiness* is
/// meaningful (B-item box, pedestal zone) are doubly optional: the outer
/// `None` is "unreadable", the inner `None` is "read, and empty".
///
/// Observations are ephemeral; nothing retains them past the gate decision.
#[derive(Debug, Clone, Default)]
pub struct RawFrameObservation {
    pub frame_index: u64,
    pub timestamp_ms: u64,
    pub screen_type: Option<ScreenType>,
    pub dungeon_level: Option<u8>,
    pub hearts: Option<Hearts>,
    pub rupees: Option<u8>,
    pub keys: Option<KeysReading>,
    pub bombs: Option<u8>,
    pub b_item: Option<Option<String>>,
    pub sword_level: Option<u8>,
    pub map_position: Option<MapPosition>,
    pub floor_items: Option<Vec<FloorItem>>,
    pub pedestal_item: Option<Option<String>>,
    pub triforce: Option<TriforceReading>,
}

impl RawFrameObservation {
    pub fn at(frame_index: u64, timestamp_ms: u64) -> Self {
        Self {
            frame_index,
            timestamp_ms,
            ..Default::default()
        }
    }
}
