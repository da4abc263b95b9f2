//! Heart meter reading.
//!
//! The heart row is a fixed grid of 8x8 tiles, two rows of eight. Each tile
//! is classified by its warm-pixel fill: full, half, outline (an empty
//! container, which still counts toward the maximum) or vacant.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::Hearts;

use crate::classify::is_warm;
use crate::util::crop_rect;
use crate::bbox::Rect;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartsConfig {
    /// Warm fill at or above which a tile is a full heart.
    pub full_min: f64,
    /// Warm fill at or above which a tile is a half heart.
    pub half_min: f64,
    /// Warm fill at or above which a tile is an empty container outline.
    pub outline_min: f64,
}

impl Default for HeartsConfig {
    fn default() -> Self {
        Self {
            full_min: 0.45,
            half_min: 0.18,
            outline_min: 0.04,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Full,
    Half,
    Outline,
    Vacant,
}

#[derive(Debug, Clone, Default)]
pub struct HeartsReader {
    config: HeartsConfig,
}

impl HeartsReader {
    pub fn new(config: HeartsConfig) -> Self {
        Self { config }
    }

    fn classify_tile(&self, tile: &RgbImage) -> Tile {
        let n = (tile.width() * tile.height()).max(1) as f64;
        let fill = tile.pixels().filter(|p| is_warm(p)).count() as f64 / n;
        if fill >= self.config.full_min {
            Tile::Full
        } else if fill >= self.config.half_min {
            Tile::Half
        } else if fill >= self.config.outline_min {
            Tile::Outline
        } else {
            Tile::Vacant
        }
    }

    /// Read the heart row region (two rows of eight 8x8 tiles). `None` when
    /// no container tile is found at all, which means the HUD was occluded
    /// or the region is miscalibrated.
    pub fn read(&self, region: &RgbImage) -> Option<Hearts> {
        if region.width() < 8 || region.height() < 8 {
            return None;
        }
        let cols = (region.width() / 8).min(8);
        let rows = (region.height() / 8).min(2);

        let mut current = 0u8;
        let mut max = 0u8;
        let mut half = false;
        // Hearts fill bottom row first, left to right.
        for row in (0..rows).rev() {
            for col in 0..cols {
                let rect = Rect::new((col * 8) as i32, (row * 8) as i32, 8, 8);
                let Some(tile) = crop_rect(region, rect) else {
                    continue;
                };
                match self.classify_tile(&tile) {
                    Tile::Full => {
                        current += 1;
                        max += 1;
                    }
                    Tile::Half => {
                        current += 1;
                        max += 1;
                        half = true;
                    }
                    Tile::Outline => max += 1,
                    Tile::Vacant => {}
                }
            }
        }

        if max == 0 {
            return None;
        }
        Some(Hearts::new(current, max, half))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const HEART_RED: Rgb<u8> = Rgb([216, 40, 0]);

    /// Paint one 8x8 tile with the given warm fill fraction.
    fn paint_tile(region: &mut RgbImage, col: u32, row: u32, fill: f64) {
        let px = (64.0 * fill).round() as u32;
        let mut painted = 0;
        'outer: for y in 0..8 {
            for x in 0..8 {
                if painted >= px {
                    break 'outer;
                }
                region.put_pixel(col * 8 + x, row * 8 + y, HEART_RED);
                painted += 1;
            }
        }
    }

    #[test]
    fn test_full_half_and_outline_tiles() {
        let mut region = RgbImage::from_pixel(64, 16, Rgb([0, 0, 0]));
        // Bottom row: two full, one half, one outline.
        paint_tile(&mut region, 0, 1, 0.8);
        paint_tile(&mut region, 1, 1, 0.8);
        paint_tile(&mut region, 2, 1, 0.25);
        paint_tile(&mut region, 3, 1, 0.08);

        let hearts = HeartsReader::new(HeartsConfig::default())
            .read(&region)
            .unwrap();
        assert_eq!(hearts, Hearts::new(3, 4, true));
    }

    #[test]
    fn test_empty_region_is_unreadable() {
        let region = RgbImage::from_pixel(64, 16, Rgb([0, 0, 0]));
        assert_eq!(HeartsReader::new(HeartsConfig::default()).read(&region), None);
    }

    #[test]
    fn test_second_row_counts_toward_max() {
        let mut region = RgbImage::from_pixel(64, 16, Rgb([0, 0, 0]));
        for col in 0..8 {
            paint_tile(&mut region, col, 1, 0.8);
        }
        paint_tile(&mut region, 0, 0, 0.8);
        paint_tile(&mut region, 1, 0, 0.08);

        let hearts = HeartsReader::new(HeartsConfig::default())
            .read(&region)
            .unwrap();
        assert_eq!(hearts, Hearts::new(9, 10, false));
    }
}
