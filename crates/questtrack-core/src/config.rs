//! Tuning knobs for the stability gate and the event trackers.
//!
//! All thresholds here are empirical. They were chosen against real capture
//! footage and are deliberately exposed as configuration rather than baked
//! into the code that uses them.

use serde::{Deserialize, Serialize};

use crate::state::MapPosition;

/// Per-field debounce thresholds: how many consecutive agreeing raw reads a
/// candidate value needs before it is promoted into the stable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Threshold for counters, icons and other fields without their own knob.
    pub default_threshold: u32,
    /// Screen classification flips are expensive for the trackers, so it
    /// gets a slightly longer debounce.
    pub screen_type: u32,
    pub hearts: u32,
    pub map_position: u32,
    /// The floor-item detector already requires consecutive-frame
    /// confirmation internally, so the gate accepts its output immediately.
    pub floor_items: u32,
    pub pedestal: u32,
    pub triforce: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            default_threshold: 2,
            screen_type: 3,
            hearts: 2,
            map_position: 2,
            floor_items: 1,
            pedestal: 2,
            triforce: 2,
        }
    }
}

/// Event tracker thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Consecutive stable hearts-zero frames that arm death detection.
    pub death_streak: u32,
    /// A non-gameplay gap at least this long is a natural screen
    /// transition; position jumps across it are not warps.
    pub natural_transition_gap: u32,
    /// Frames a same-screen-type position jump must persist, with no
    /// screen-type change, before it is reported as a warp. The position
    /// and screen-type fields debounce at different rates, so a jump seen
    /// this close to a screen-type change is transition fallout.
    pub warp_settle_frames: u32,
    /// Items detected above this play-area y coordinate count as held
    /// overhead rather than lying on the floor.
    pub hold_y_max: u32,
    /// Consecutive stable frames an overhead hold must persist before the
    /// hold tracker fires.
    pub min_hold_frames: u32,
    /// Item labels that count as an overhead hold worth inferring from.
    pub holdable_labels: Vec<String>,
    /// Consecutive stable frames a pedestal item must be visible before it
    /// is considered present.
    pub pedestal_visible_frames: u32,
    /// Consecutive stable empty reads that confirm a pedestal pickup.
    pub pedestal_gone_frames: u32,
    /// Overworld cell the player respawns at after a death.
    pub overworld_start: MapPosition,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            death_streak: 3,
            natural_transition_gap: 4,
            warp_settle_frames: 2,
            hold_y_max: 88,
            min_hold_frames: 3,
            holdable_labels: vec!["triforce".to_string()],
            pedestal_visible_frames: 2,
            pedestal_gone_frames: 3,
            overworld_start: MapPosition::new(7, 7),
        }
    }
}
