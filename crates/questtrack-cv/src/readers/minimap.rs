//! Minimap blip decoding.
//!
//! The minimap renders the player as a single bright blip on a dark map.
//! The blip's cell is folded into the same position byte the game itself
//! uses, then decoded with the screen-type-dependent grid width. Byte 0 is
//! indistinguishable from "no blip found" and is always reported absent.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::{MapPosition, ScreenType};

use crate::util::luma;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimapConfig {
    /// Luma at or above which a pixel can be the player blip.
    pub blip_luma_min: f64,
    /// Minimum bright pixels in a cell before it counts as the blip.
    pub blip_pixels_min: u32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            blip_luma_min: 160.0,
            blip_pixels_min: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MinimapReader {
    config: MinimapConfig,
}

impl MinimapReader {
    pub fn new(config: MinimapConfig) -> Self {
        Self { config }
    }

    /// Decode the player position from the minimap region. The blip flashes,
    /// so absence on any single frame is normal; the stability gate keeps
    /// the last stable cell.
    pub fn read(&self, region: &RgbImage, screen: ScreenType) -> Option<MapPosition> {
        if !screen.is_gameplay() {
            return None;
        }
        let byte = self.position_byte(region, screen)?;
        MapPosition::decode(byte, screen)
    }

    /// Fold the brightest cell into the game's position byte.
    fn position_byte(&self, region: &RgbImage, screen: ScreenType) -> Option<u8> {
        let width = screen.grid_width() as u32;
        let rows = 8u32;
        if region.width() < width || region.height() < rows {
            return None;
        }
        let cell_w = region.width() / width;
        let cell_h = region.height() / rows;

        let mut best: Option<(u32, u8)> = None;
        for row in 0..rows {
            for col in 0..width {
                let mut bright = 0u32;
                for y in row * cell_h..(row + 1) * cell_h {
                    for x in col * cell_w..(col + 1) * cell_w {
                        if luma(region.get_pixel(x, y)) >= self.config.blip_luma_min {
                            bright += 1;
                        }
                    }
                }
                if bright >= self.config.blip_pixels_min
                    && best.map(|(b, _)| bright > b).unwrap_or(true)
                {
                    best = Some((bright, (row * width + col) as u8));
                }
            }
        }
        best.map(|(_, byte)| byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn map_with_blip(col: u32, row: u32, cell_w: u32, cell_h: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(cell_w * 16, cell_h * 8, Rgb([30, 30, 30]));
        for dy in 0..2 {
            for dx in 0..2 {
                img.put_pixel(col * cell_w + dx, row * cell_h + dy, Rgb([120, 255, 120]));
            }
        }
        img
    }

    #[test]
    fn test_overworld_blip_decodes_to_cell() {
        let reader = MinimapReader::default();
        let map = map_with_blip(7, 7, 4, 4);
        assert_eq!(
            reader.read(&map, ScreenType::Overworld),
            Some(MapPosition::new(7, 7))
        );
    }

    #[test]
    fn test_dungeon_uses_eight_wide_grid() {
        let reader = MinimapReader::default();
        // Same 64-wide region; dungeon cells are 8px wide.
        let mut map = RgbImage::from_pixel(64, 32, Rgb([30, 30, 30]));
        for dy in 0..2 {
            for dx in 0..2 {
                map.put_pixel(3 * 8 + dx, 2 * 4 + dy, Rgb([255, 255, 255]));
            }
        }
        assert_eq!(
            reader.read(&map, ScreenType::Dungeon),
            Some(MapPosition::new(3, 2))
        );
    }

    #[test]
    fn test_top_left_cell_is_ambiguous_and_absent() {
        let reader = MinimapReader::default();
        let map = map_with_blip(0, 0, 4, 4);
        assert_eq!(reader.read(&map, ScreenType::Overworld), None);
    }

    #[test]
    fn test_no_blip_is_absent() {
        let reader = MinimapReader::default();
        let map = RgbImage::from_pixel(64, 32, Rgb([30, 30, 30]));
        assert_eq!(reader.read(&map, ScreenType::Overworld), None);
    }

    #[test]
    fn test_non_gameplay_screen_is_absent() {
        let reader = MinimapReader::default();
        let map = map_with_blip(7, 7, 4, 4);
        assert_eq!(reader.read(&map, ScreenType::Subscreen), None);
    }
}
