//! Pedestal-zone reading for dungeon item rooms.
//!
//! Item rooms present their prize alone on a pedestal in a mostly dark
//! room. The reader first checks that isolation (mean luma of the zone
//! outside the best match must stay under a ceiling); without it, a busy
//! combat room with a matching sprite would read as a pedestal. The read
//! distinguishes "empty pedestal zone" from "could not read": the tracker
//! downstream needs confirmed disappearance, not mere absence of signal.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::bbox::Rect;
use crate::template::TemplateSet;
use crate::util::mean_luma;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedestalConfig {
    /// Similarity at or above which a sprite is on the pedestal.
    pub score_floor: f64,
    /// Mean luma ceiling for the zone outside the matched sprite.
    pub isolation_luma_max: f64,
}

impl Default for PedestalConfig {
    fn default() -> Self {
        Self {
            score_floor: 0.75,
            isolation_luma_max: 40.0,
        }
    }
}

pub struct PedestalReader {
    config: PedestalConfig,
    templates: Vec<(String, RgbImage)>,
}

impl PedestalReader {
    /// Built from the same `floor_*` sprites the floor detector uses.
    pub fn from_templates(templates: &TemplateSet, config: PedestalConfig) -> Option<Self> {
        let sprites: Vec<(String, RgbImage)> = templates
            .with_prefix("floor_")
            .into_iter()
            .map(|t| (t.label("floor_").to_string(), t.rgb.clone()))
            .collect();
        if sprites.is_empty() {
            return None;
        }
        Some(Self {
            config,
            templates: sprites,
        })
    }

    /// Read the pedestal zone. Outer `None` means the zone could not be
    /// judged (not isolated, too small); `Some(None)` is a confirmed empty
    /// pedestal; `Some(Some(label))` is the prize.
    pub fn read(&self, zone: &RgbImage) -> Option<Option<String>> {
        if zone.width() < 8 || zone.height() < 8 {
            return None;
        }

        let best = self.best_match(zone);
        match best {
            Some((label, rect, _score)) => {
                if self.surroundings_luma(zone, rect) <= self.config.isolation_luma_max {
                    Some(Some(label))
                } else {
                    None
                }
            }
            None => {
                // Nothing matched. Dark zone: confirmed empty. Bright or
                // busy zone: unreadable.
                if mean_luma(zone) <= self.config.isolation_luma_max {
                    Some(None)
                } else {
                    None
                }
            }
        }
    }

    fn best_match(&self, zone: &RgbImage) -> Option<(String, Rect, f64)> {
        let mut best: Option<(String, Rect, f64)> = None;
        for (label, sprite) in &self.templates {
            let (tw, th) = sprite.dimensions();
            if tw > zone.width() || th > zone.height() {
                continue;
            }
            for oy in 0..=(zone.height() - th) {
                for ox in 0..=(zone.width() - tw) {
                    let score = Self::similarity(zone, ox, oy, sprite);
                    if score >= self.config.score_floor
                        && best.as_ref().map(|(_, _, b)| score > *b).unwrap_or(true)
                    {
                        best = Some((
                            label.clone(),
                            Rect::new(ox as i32, oy as i32, tw as i32, th as i32),
                            score,
                        ));
                    }
                }
            }
        }
        best
    }

    fn similarity(zone: &RgbImage, ox: u32, oy: u32, sprite: &RgbImage) -> f64 {
        let (tw, th) = sprite.dimensions();
        let mut diff = 0u64;
        for ty in 0..th {
            for tx in 0..tw {
                let a = zone.get_pixel(ox + tx, oy + ty).0;
                let b = sprite.get_pixel(tx, ty).0;
                diff += a[0].abs_diff(b[0]) as u64
                    + a[1].abs_diff(b[1]) as u64
                    + a[2].abs_diff(b[2]) as u64;
            }
        }
        1.0 - diff as f64 / ((tw * th * 3) as f64 * 255.0)
    }

    /// Mean luma of the zone with the matched sprite blanked out.
    fn surroundings_luma(&self, zone: &RgbImage, sprite_rect: Rect) -> f64 {
        let mut sum = 0.0;
        let mut n = 0u32;
        for (x, y, p) in zone.enumerate_pixels() {
            let inside = (x as i32) >= sprite_rect.x
                && (x as i32) < sprite_rect.x + sprite_rect.width
                && (y as i32) >= sprite_rect.y
                && (y as i32) < sprite_rect.y + sprite_rect.height;
            if !inside {
                sum += crate::util::luma(p);
                n += 1;
            }
        }
        if n == 0 { 0.0 } else { sum / n as f64 }
    }

}
