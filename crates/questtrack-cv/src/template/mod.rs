//! Shape and sprite templates.
//!
//! Template files are named by role:
//! - `digit_0.png` .. `digit_9.png`, `digit_a.png`: counter glyphs
//!   (`digit_a` is the master-key letter shown in the key counter);
//! - `icon_<label>.png`: HUD item icons (B box, sword box);
//! - `floor_<label>.png`: full-colour play-area sprites (floor items,
//!   pedestal items, the held triforce piece).

pub mod loader;

pub use loader::TemplateSet;

use image::{GrayImage, RgbImage};

/// One loaded template: the original colour sprite plus a precomputed
/// grayscale plane for binarized matching.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub rgb: RgbImage,
    pub gray: GrayImage,
}

impl Template {
    pub fn new(name: impl Into<String>, rgb: RgbImage) -> Self {
        let gray = image::imageops::grayscale(&rgb);
        Self {
            name: name.into(),
            rgb,
            gray,
        }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Field label for a prefixed template name (`floor_red_ring` →
    /// `red_ring`).
    pub fn label(&self, prefix: &str) -> &str {
        self.name.strip_prefix(prefix).unwrap_or(&self.name)
    }
}
