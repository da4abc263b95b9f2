//! HUD counter reading (rupees, keys, bombs, dungeon level).
//!
//! Counters occupy one or two 8x8 digit tiles. A single-digit counter sits
//! in the TENS tile with a dark ones tile; a dark ones tile therefore means
//! "absent", never "zero".

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::KeysReading;

use crate::matcher::{BinaryShapeMatcher, MatcherConfig};
use crate::template::TemplateSet;
use crate::util::mean_luma;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Score below which no digit glyph is trusted.
    pub score_floor: f64,
    /// Mean luma below which a digit tile is considered empty.
    pub empty_tile_luma: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            score_floor: 0.70,
            empty_tile_luma: 20.0,
        }
    }
}

pub struct CounterReader {
    config: CounterConfig,
    matcher: BinaryShapeMatcher,
}

impl CounterReader {
    /// Build from the `digit_*` templates in the set. Returns `None` when
    /// none are present, so the caller can disable counter reading.
    pub fn from_templates(
        templates: &TemplateSet,
        matcher: MatcherConfig,
        config: CounterConfig,
    ) -> Option<Self> {
        let digits = templates.with_prefix("digit_");
        if digits.is_empty() {
            return None;
        }
        Some(Self {
            config,
            matcher: BinaryShapeMatcher::from_templates(matcher, digits),
        })
    }

    /// Best digit glyph in one tile. `None` when the tile is dark or no
    /// glyph scores above the floor.
    fn read_tile(&self, tile: &RgbImage) -> Option<char> {
        if mean_luma(tile) < self.config.empty_tile_luma {
            return None;
        }
        let matches = self.matcher.match_region(tile, None);
        let best = matches.first()?;
        if best.score < self.config.score_floor {
            return None;
        }
        best.label.strip_prefix("digit_")?.chars().next()
    }

    /// Read a 0-99 counter from its tens and ones tiles. The ones tile may
    /// be absent from the frame entirely (clipped capture).
    pub fn read_count(&self, tens: &RgbImage, ones: Option<&RgbImage>) -> Option<u8> {
        let first = self.read_tile(tens)?;
        let first = first.to_digit(10)? as u8;
        match ones.and_then(|tile| self.read_tile(tile)) {
            Some(second) => {
                let second = second.to_digit(10)? as u8;
                Some(first * 10 + second)
            }
            // Dark ones tile: the counter is single-digit and the tens
            // tile holds its value.
            None => Some(first),
        }
    }

    /// Read the key counter, where a letter glyph replaces the digits once
    /// the master key is held.
    pub fn read_keys(&self, tens: &RgbImage, ones: Option<&RgbImage>) -> Option<KeysReading> {
        if self.read_tile(tens)? == 'a' {
            return Some(KeysReading::MasterKey);
        }
        self.read_count(tens, ones).map(KeysReading::Count)
    }

    /// Read the single-digit dungeon level. 0 means "not in a dungeon".
    pub fn read_level(&self, tile: &RgbImage) -> Option<u8> {
        let c = self.read_tile(tile)?;
        c.to_digit(10).map(|d| d as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use image::Rgb;

    fn glyph(pattern: &[&str]) -> RgbImage {
        let mut img = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        for (y, row) in pattern.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    img.put_pixel(x as u32, y as u32, Rgb([255, 255, 255]));
                }
            }
        }
        img
    }

    fn one() -> RgbImage {
        glyph(&[
            "...#....", "..##....", "...#....", "...#....", "...#....", "...#....", "..###...",
            "........",
        ])
    }

    fn seven() -> RgbImage {
        glyph(&[
            ".#####..", ".....#..", "....#...", "...#....", "...#....", "...#....", "...#....",
            "........",
        ])
    }

    fn letter_a() -> RgbImage {
        glyph(&[
            "..###...", ".#...#..", ".#...#..", ".#####..", ".#...#..", ".#...#..", ".#...#..",
            "........",
        ])
    }

    fn reader() -> CounterReader {
        let set = TemplateSet::from_templates(vec![
            Template::new("digit_1", one()),
            Template::new("digit_7", seven()),
            Template::new("digit_a", letter_a()),
        ]);
        CounterReader::from_templates(&set, MatcherConfig::default(), CounterConfig::default())
            .unwrap()
    }

    #[test]
    fn test_dark_ones_tile_means_single_digit() {
        let r = reader();
        let dark = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        assert_eq!(r.read_count(&seven(), Some(&dark)), Some(7));
    }

    #[test]
    fn test_two_digit_count() {
        let r = reader();
        assert_eq!(r.read_count(&one(), Some(&seven())), Some(17));
    }

    #[test]
    fn test_master_key_glyph() {
        let r = reader();
        let dark = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        assert_eq!(r.read_keys(&letter_a(), Some(&dark)), Some(KeysReading::MasterKey));
        assert_eq!(r.read_keys(&one(), Some(&dark)), Some(KeysReading::Count(1)));
    }

    #[test]
    fn test_unreadable_tile_is_none() {
        let r = reader();
        let dark = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        assert_eq!(r.read_count(&dark, None), None);
    }

    #[test]
    fn test_no_digit_templates_disables_reader() {
        let set = TemplateSet::from_templates(vec![Template::new(
            "floor_bomb",
            RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])),
        )]);
        assert!(
            CounterReader::from_templates(&set, MatcherConfig::default(), CounterConfig::default())
                .is_none()
        );
    }
}
