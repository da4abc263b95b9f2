//! Floor-item detection over the play area.
//!
//! Unlike the HUD readers this works in full colour: floor sprites are
//! multi-coloured and their palette is the main discriminator. Each
//! `floor_*` template slides over the play area; windows whose mean
//! per-channel difference is low enough become candidate detections, joint
//! distance NMS collapses overlaps across templates, and a detection must
//! survive consecutive frames before it is reported.

use image::RgbImage;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use questtrack_core::FloorItem;

use crate::bbox::{BBox, Detections};
use crate::template::{Template, TemplateSet};
use crate::util::images_identical;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorConfig {
    /// Similarity at or above which a window is a candidate. Tunable
    /// between roughly 0.70 and 0.80 per skin.
    pub score_floor: f64,
    /// Outer band of the play area excluded from search, in pixels.
    /// Sprites there are partially scrolled off and match unreliably.
    pub margin: u32,
    /// Joint NMS radius across all templates, in pixels.
    pub nms_distance: f64,
    /// Consecutive frames a detection must persist before it is reported.
    pub confirm_frames: u32,
    /// Sliding-window stride in pixels.
    pub stride: u32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            score_floor: 0.75,
            margin: 16,
            nms_distance: 12.0,
            confirm_frames: 2,
            stride: 2,
        }
    }
}

struct FloorTemplate {
    label: String,
    rgb: RgbImage,
}

/// Stateful floor-item detector. One per pipeline; the confirmation streak
/// and the frame-diff guard both carry state between frames.
pub struct FloorItemDetector {
    config: FloorConfig,
    templates: Vec<FloorTemplate>,
    /// Candidate set awaiting confirmation, with its streak length.
    pending: Vec<(FloorItem, u32)>,
    confirmed: Vec<FloorItem>,
    last_region: Option<RgbImage>,
}

impl FloorItemDetector {
    /// Build from the `floor_*` templates. `None` when the set has none.
    pub fn from_templates(templates: &TemplateSet, config: FloorConfig) -> Option<Self> {
        let floor: Vec<FloorTemplate> = templates
            .with_prefix("floor_")
            .into_iter()
            .map(|t: &Template| FloorTemplate {
                label: t.label("floor_").to_string(),
                rgb: t.rgb.clone(),
            })
            .collect();
        if floor.is_empty() {
            return None;
        }
        Some(Self {
            config,
            templates: floor,
            pending: Vec::new(),
            confirmed: Vec::new(),
            last_region: None,
        })
    }

    /// Detect items in this frame's play area. Returns the *confirmed* set.
    pub fn detect(&mut self, play_area: &RgbImage) -> Vec<FloorItem> {
        // Static scene: identical pixels cannot change the answer, so skip
        // the sliding windows and replay the last confirmed result.
        if let Some(last) = &self.last_region {
            if images_identical(last, play_area) {
                self.advance_streaks(self.raw_detect_cached());
                return self.confirmed.clone();
            }
        }

        let raw = self.raw_detect(play_area);
        self.last_region = Some(play_area.clone());
        self.advance_streaks(raw);
        self.confirmed.clone()
    }

    /// On a byte-identical frame the raw detections equal the previous
    /// frame's candidates.
    fn raw_detect_cached(&self) -> Vec<FloorItem> {
        self.pending.iter().map(|(item, _)| item.clone()).collect()
    }

    fn advance_streaks(&mut self, raw: Vec<FloorItem>) {
        let previous = std::mem::take(&mut self.pending);
        self.pending = raw
            .into_iter()
            .map(|item| {
                let streak = previous
                    .iter()
                    .find(|(prev, _)| *prev == item)
                    .map(|(_, n)| n + 1)
                    .unwrap_or(1);
                (item, streak)
            })
            .collect();
        self.confirmed = self
            .pending
            .iter()
            .filter(|(_, streak)| *streak >= self.config.confirm_frames)
            .map(|(item, _)| item.clone())
            .collect();
    }

    fn raw_detect(&self, play_area: &RgbImage) -> Vec<FloorItem> {
        #[cfg(feature = "parallel")]
        let iter = self.templates.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = self.templates.iter();

        let boxes: Vec<BBox> = iter
            .flat_map(|t| self.match_template(play_area, t))
            .collect();

        Detections::from_vec(boxes)
            .apply_distance_nms(self.config.nms_distance)
            .into_iter()
            .map(|b| FloorItem::new(b.label, b.x as u32, b.y as u32, b.score))
            .collect()
    }

    /// All windows of one template scoring above the floor.
    fn match_template(&self, play_area: &RgbImage, t: &FloorTemplate) -> Vec<BBox> {
        let (tw, th) = t.rgb.dimensions();
        let (pw, ph) = play_area.dimensions();
        let margin = self.config.margin;
        if pw < tw + 2 * margin || ph < th + 2 * margin {
            return Vec::new();
        }

        let stride = self.config.stride.max(1);
        let mut boxes = Vec::new();
        let mut oy = margin;
        while oy + th <= ph - margin {
            let mut ox = margin;
            while ox + tw <= pw - margin {
                let score = Self::window_similarity(play_area, ox, oy, &t.rgb);
                if score >= self.config.score_floor {
                    boxes.push(
                        BBox::new(ox as i32, oy as i32, tw as i32, th as i32, score)
                            .with_label(t.label.clone()),
                    );
                }
                ox += stride;
            }
            oy += stride;
        }
        boxes
    }

    /// Full-colour similarity of one window: 1 minus the mean per-channel
    /// absolute difference, normalized to [0, 1].
    fn window_similarity(play_area: &RgbImage, ox: u32, oy: u32, template: &RgbImage) -> f64 {
        let (tw, th) = template.dimensions();
        let mut diff = 0u64;
        for ty in 0..th {
            for tx in 0..tw {
                let a = play_area.get_pixel(ox + tx, oy + ty).0;
                let b = template.get_pixel(tx, ty).0;
                diff += a[0].abs_diff(b[0]) as u64
                    + a[1].abs_diff(b[1]) as u64
                    + a[2].abs_diff(b[2]) as u64;
            }
        }
        let total = (tw * th * 3) as f64 * 255.0;
        1.0 - diff as f64 / total
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.confirmed.clear();
        self.last_region = None;
    }
}
