use serde::{Deserialize, Serialize};

/// Coarse classification of a single frame.
///
/// Exhaustive on purpose: downstream dispatch is always a `match`, never a
/// string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenType {
    Title,
    Overworld,
    Dungeon,
    Cave,
    Subscreen,
    Death,
    Transition,
    Unknown,
}

impl ScreenType {
    /// Screens on which the player is actually controlling the game.
    pub fn is_gameplay(self) -> bool {
        matches!(
            self,
            ScreenType::Overworld | ScreenType::Dungeon | ScreenType::Cave
        )
    }

    /// Minimap grid width for this screen type. The overworld (and caves,
    /// which keep the overworld map visible) is 16 columns wide; dungeon
    /// maps are 8.
    pub fn grid_width(self) -> u8 {
        match self {
            ScreenType::Dungeon => 8,
            _ => 16,
        }
    }
}

impl Default for ScreenType {
    fn default() -> Self {
        ScreenType::Unknown
    }
}

/// A map cell, decoded from the single position byte the minimap encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapPosition {
    pub col: u8,
    pub row: u8,
}

impl MapPosition {
    pub fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Decode a raw position byte. Byte 0 is ambiguous with "no reading at
    /// all" and is always treated as absent, never as the top-left cell.
    pub fn decode(byte: u8, screen: ScreenType) -> Option<Self> {
        if byte == 0 {
            return None;
        }
        let width = screen.grid_width();
        Some(Self {
            col: byte % width,
            row: byte / width,
        })
    }

    /// Re-encode into the position byte for the given screen type.
    pub fn encode(self, screen: ScreenType) -> u8 {
        self.row * screen.grid_width() + self.col
    }

    /// Chebyshev distance in grid cells. Adjacent screens (including
    /// diagonals) are distance 1; anything larger is a discontinuity.
    pub fn grid_distance(self, other: MapPosition) -> u8 {
        let dc = self.col.abs_diff(other.col);
        let dr = self.row.abs_diff(other.row);
        dc.max(dr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_zero_is_absent() {
        assert_eq!(MapPosition::decode(0, ScreenType::Overworld), None);
        assert_eq!(MapPosition::decode(0, ScreenType::Dungeon), None);
    }

    #[test]
    fn test_decode_grid_width_depends_on_screen() {
        // Byte 0x23 = 35: overworld (16 wide) -> col 3, row 2;
        // dungeon (8 wide) -> col 3, row 4.
        let over = MapPosition::decode(0x23, ScreenType::Overworld).unwrap();
        assert_eq!((over.col, over.row), (3, 2));

        let dun = MapPosition::decode(0x23, ScreenType::Dungeon).unwrap();
        assert_eq!((dun.col, dun.row), (3, 4));
    }

    #[test]
    fn test_encode_round_trip() {
        let pos = MapPosition::new(7, 7);
        let byte = pos.encode(ScreenType::Overworld);
        assert_eq!(MapPosition::decode(byte, ScreenType::Overworld), Some(pos));
    }

    #[test]
    fn test_grid_distance() {
        let a = MapPosition::new(4, 4);
        assert_eq!(a.grid_distance(MapPosition::new(5, 4)), 1);
        assert_eq!(a.grid_distance(MapPosition::new(5, 5)), 1);
        assert_eq!(a.grid_distance(MapPosition::new(7, 4)), 3);
    }
}
