//! Region calibration: mapping raw capture pixels to the named sub-regions
//! the field readers consume.
//!
//! Every field resolves to exactly one of two region kinds, decided once
//! when the profile is loaded:
//! - `Landmark`: an explicitly calibrated rectangle in source-frame
//!   pixels, extracted verbatim, grid math never consulted;
//! - `GridCell`: a cell of the rigid canonical layout (256x240), shifted
//!   by the profile's grid offset, extracted from the crop after scaling.
//!
//! The two paths never mix for one field, and grid offsets are never
//! re-derived from landmark pixels at read time.

use std::collections::HashMap;

use image::RgbImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::bbox::Rect;
use crate::error::ConfigError;
use crate::util::crop_rect;

/// Canonical frame dimensions all grid cells are expressed in.
pub const CANONICAL_WIDTH: u32 = 256;
pub const CANONICAL_HEIGHT: u32 = 240;

/// One explicitly calibrated rectangle, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub rect: Rect,
}

/// Calibration for one tracked entity's video source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Game-picture rectangle within the raw capture frame.
    pub crop: Rect,
    /// Canonical-space shift applied to every grid cell.
    #[serde(default)]
    pub grid_offset: (i32, i32),
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub confidence: f64,
    /// Where this profile came from (auto-detect run, manual tool, ...).
    #[serde(default)]
    pub provenance: String,
}

impl CalibrationProfile {
    /// Profile that assumes the capture is exactly the game picture.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            crop: Rect::new(0, 0, width as i32, height as i32),
            grid_offset: (0, 0),
            landmarks: Vec::new(),
            confidence: 0.0,
            provenance: "full_frame".to_string(),
        }
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Replace (or add) a landmark, keyed strictly by name. Positional
    /// merging would break the moment the calibration tool reorders its
    /// output, so it is not offered.
    pub fn merge_landmark(&mut self, landmark: Landmark) {
        match self.landmarks.iter_mut().find(|l| l.name == landmark.name) {
            Some(existing) => existing.rect = landmark.rect,
            None => self.landmarks.push(landmark),
        }
    }
}

/// The resolved extraction strategy for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRegion {
    /// Pixel-exact rectangle in source-frame coordinates.
    Landmark(Rect),
    /// Rectangle in canonical coordinates, grid offset already applied.
    GridCell(Rect),
}

/// The rigid canonical HUD/play-area layout, in canonical pixels.
/// (x, y, w, h) per field name.
pub const GRID_LAYOUT: &[(&str, (i32, i32, i32, i32))] = &[
    ("level_digit", (72, 8, 8, 8)),
    ("rupees_tens", (96, 16, 8, 8)),
    ("rupees_ones", (104, 16, 8, 8)),
    ("keys_tens", (96, 32, 8, 8)),
    ("keys_ones", (104, 32, 8, 8)),
    ("bombs_tens", (96, 40, 8, 8)),
    ("bombs_ones", (104, 40, 8, 8)),
    ("b_item", (124, 24, 8, 16)),
    ("sword", (148, 24, 8, 16)),
    ("hearts", (176, 32, 64, 16)),
    ("minimap", (16, 8, 64, 32)),
    ("play_area", (0, 64, 256, 176)),
    ("pedestal", (96, 128, 64, 32)),
    ("triforce", (80, 112, 96, 48)),
];

/// Extraction plan for one calibration profile.
#[derive(Debug, Clone)]
pub struct RegionCalibrator {
    crop: Rect,
    regions: HashMap<String, FieldRegion>,
}

/// A frame with its canonical-scaled crop, prepared once per frame so every
/// grid-driven field shares the same resample.
pub struct CalibratedFrame<'a> {
    pub source: &'a RgbImage,
    pub canonical: RgbImage,
}

impl RegionCalibrator {
    /// Resolve every field's region kind from the profile. This is the only
    /// place the landmark-vs-grid decision is made.
    pub fn from_profile(profile: &CalibrationProfile) -> Result<Self> {
        if profile.crop.is_empty() {
            return Err(ConfigError::EmptyCrop.into());
        }
        if let Some(landmark) = profile.landmarks.iter().find(|l| l.rect.is_empty()) {
            return Err(ConfigError::EmptyLandmark(landmark.name.clone()).into());
        }

        let (dx, dy) = profile.grid_offset;
        let mut regions = HashMap::new();
        for &(name, (x, y, w, h)) in GRID_LAYOUT {
            let region = match profile.landmarks.iter().find(|l| l.name == name) {
                Some(landmark) => FieldRegion::Landmark(landmark.rect),
                None => FieldRegion::GridCell(Rect::new(x + dx, y + dy, w, h)),
            };
            regions.insert(name.to_string(), region);
        }

        Ok(Self {
            crop: profile.crop,
            regions,
        })
    }

    /// Crop and scale one frame to canonical space. Landmark fields keep a
    /// reference to the untouched source.
    pub fn prepare<'a>(&self, frame: &'a RgbImage) -> CalibratedFrame<'a> {
        let cropped = crop_rect(frame, self.crop).unwrap_or_else(|| frame.clone());
        let canonical = if cropped.dimensions() == (CANONICAL_WIDTH, CANONICAL_HEIGHT) {
            cropped
        } else {
            image::imageops::resize(
                &cropped,
                CANONICAL_WIDTH,
                CANONICAL_HEIGHT,
                FilterType::Nearest,
            )
        };
        CalibratedFrame {
            source: frame,
            canonical,
        }
    }

    /// Extract one named field region. `None` when the region falls outside
    /// the frame (bad landmark, clipped capture).
    pub fn extract(&self, frame: &CalibratedFrame<'_>, field: &str) -> Option<RgbImage> {
        match self.regions.get(field)? {
            FieldRegion::Landmark(rect) => crop_rect(frame.source, *rect),
            FieldRegion::GridCell(rect) => crop_rect(&frame.canonical, *rect),
        }
    }

    pub fn region_kind(&self, field: &str) -> Option<&FieldRegion> {
        self.regions.get(field)
    }
}
