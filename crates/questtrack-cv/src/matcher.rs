//! Binarized shape matching.
//!
//! Both the search region and every template are reduced to on/off masks at
//! a fixed brightness threshold; the score for a template is the best
//! sliding-window mask agreement over the region, normalized to [0, 1].
//! This is deliberately classical and deterministic: the same pixels always
//! produce the same ranking.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::template::Template;
use crate::util::{luma, near_color};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Luma at or above which a pixel is "on".
    pub brightness_threshold: u8,
    /// Per-channel tolerance when suppressing background colours.
    pub bg_tolerance: u8,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: 96,
            bg_tolerance: 24,
        }
    }
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMatch {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct BinaryTemplate {
    name: String,
    width: u32,
    height: u32,
    mask: Vec<bool>,
}

/// Template-shape matcher over binarized masks.
pub struct BinaryShapeMatcher {
    config: MatcherConfig,
    templates: Vec<BinaryTemplate>,
}

impl BinaryShapeMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            templates: Vec::new(),
        }
    }

    pub fn from_templates<'a, I>(config: MatcherConfig, templates: I) -> Self
    where
        I: IntoIterator<Item = &'a Template>,
    {
        let mut matcher = Self::new(config);
        for template in templates {
            matcher.add_template(template);
        }
        matcher
    }

    /// Binarize and store one template.
    pub fn add_template(&mut self, template: &Template) {
        let threshold = self.config.brightness_threshold;
        let mask = template
            .gray
            .pixels()
            .map(|p| p.0[0] >= threshold)
            .collect();
        self.templates.push(BinaryTemplate {
            name: template.name.clone(),
            width: template.width(),
            height: template.height(),
            mask,
        });
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Score every loaded template against a region and return the ranked
    /// results, best first. Absence of a match is a low score or an empty
    /// list, never an error.
    ///
    /// `bg_colors` zeroes near-matching pixels before thresholding. That is
    /// only sound when the background is near-black (HUD panels); brighter
    /// backgrounds would punch "off" holes through legitimate shapes.
    pub fn match_region(&self, region: &RgbImage, bg_colors: Option<&[[u8; 3]]>) -> Vec<ShapeMatch> {
        if self.templates.is_empty() || region.width() == 0 || region.height() == 0 {
            return Vec::new();
        }

        let region_mask = self.binarize_region(region, bg_colors);
        let rw = region.width();
        let rh = region.height();

        let mut matches: Vec<ShapeMatch> = self
            .templates
            .iter()
            .filter(|t| t.width <= rw && t.height <= rh)
            .map(|t| ShapeMatch {
                label: t.name.clone(),
                score: Self::best_agreement(&region_mask, rw, rh, t),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
        matches
    }

    fn binarize_region(&self, region: &RgbImage, bg_colors: Option<&[[u8; 3]]>) -> Vec<bool> {
        let threshold = self.config.brightness_threshold;
        let tolerance = self.config.bg_tolerance;
        region
            .pixels()
            .map(|p| {
                if let Some(colors) = bg_colors {
                    if colors.iter().any(|&c| near_color(p, c, tolerance)) {
                        return false;
                    }
                }
                luma(p) >= threshold as f64
            })
            .collect()
    }

    /// Best sliding-window agreement of one template over the region mask.
    fn best_agreement(region_mask: &[bool], rw: u32, rh: u32, t: &BinaryTemplate) -> f64 {
        let total = (t.width * t.height) as f64;
        if total == 0.0 {
            return 0.0;
        }

        let mut best = 0.0f64;
        for oy in 0..=(rh - t.height) {
            for ox in 0..=(rw - t.width) {
                let mut agree = 0u32;
                for ty in 0..t.height {
                    let region_row = ((oy + ty) * rw + ox) as usize;
                    let template_row = (ty * t.width) as usize;
                    for tx in 0..t.width as usize {
                        if region_mask[region_row + tx] == t.mask[template_row + tx] {
                            agree += 1;
                        }
                    }
                }
                best = best.max(agree as f64 / total);
            }
        }
        best
    }
}
