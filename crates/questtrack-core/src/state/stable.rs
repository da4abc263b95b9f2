use serde::{Deserialize, Serialize};

use super::observation::FloorItem;
use super::screen::{MapPosition, ScreenType};

/// Canonical, debounced game state for one tracked entity.
///
/// Mutated only by stability-gate promotions. Event trackers receive it by
/// shared reference and never write to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StableGameState {
    pub screen_type: ScreenType,
    /// 0 when not in a dungeon.
    pub dungeon_level: u8,
    pub hearts_current: u8,
    pub hearts_max: u8,
    pub half_heart: bool,
    pub rupees: u8,
    pub keys: u8,
    pub has_master_key: bool,
    pub bombs: u8,
    /// `None` until a B-item has ever been observed.
    pub b_item: Option<String>,
    pub sword_level: u8,
    /// `None` until the minimap blip has ever been decoded.
    pub map_position: Option<MapPosition>,
    pub floor_items: Vec<FloorItem>,
    /// Confirmed content of the pedestal hot zone; `None` means empty.
    pub pedestal_item: Option<String>,
    pub triforce_count: u8,
    pub triforce_bits: u8,
}
