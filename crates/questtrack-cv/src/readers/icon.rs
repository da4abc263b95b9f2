//! HUD item-box icon reading (B item, sword).
//!
//! Some item icons share a silhouette and differ only in palette (blue
//! candle vs red candle, arrow tiers). Shape matching alone cannot split
//! those, so declared twin pairs fall back to a warm-vs-cool colour ratio
//! when their shape scores are too close to call.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::classify::is_warm;
use crate::matcher::{BinaryShapeMatcher, MatcherConfig};
use crate::template::TemplateSet;
use crate::util::mean_luma;

/// Two icon labels that share a silhouette. When both land within
/// `twin_epsilon` of each other, `warm` wins on a red-dominant box and
/// `cool` wins otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinRule {
    pub warm: String,
    pub cool: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconConfig {
    /// Top shape score below which the box is unreadable.
    pub score_floor: f64,
    /// Score gap under which a twin pair is resolved by colour.
    pub twin_epsilon: f64,
    /// Mean luma below which the box is read as empty.
    pub empty_luma: f64,
    /// Warm-pixel fraction above which a twin resolves to its warm member.
    pub warm_ratio_min: f64,
    pub twins: Vec<TwinRule>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            score_floor: 0.30,
            twin_epsilon: 0.05,
            empty_luma: 14.0,
            warm_ratio_min: 0.25,
            twins: vec![
                TwinRule {
                    warm: "red_candle".to_string(),
                    cool: "blue_candle".to_string(),
                },
                TwinRule {
                    warm: "red_ring".to_string(),
                    cool: "blue_ring".to_string(),
                },
            ],
        }
    }
}

/// What one icon-box read produced.
#[derive(Debug, Clone, PartialEq)]
pub enum IconRead {
    /// The box is dark: confirmed empty.
    Empty,
    /// A confident icon.
    Icon(String),
    /// Pixels present but nothing scored above the floor.
    Unreadable,
}

pub struct IconReader {
    config: IconConfig,
    matcher: BinaryShapeMatcher,
}

impl IconReader {
    /// Build from the `icon_*` templates. `None` when the set has none.
    pub fn from_templates(
        templates: &TemplateSet,
        matcher: MatcherConfig,
        config: IconConfig,
    ) -> Option<Self> {
        let icons = templates.with_prefix("icon_");
        if icons.is_empty() {
            return None;
        }
        Some(Self {
            config,
            matcher: BinaryShapeMatcher::from_templates(matcher, icons),
        })
    }

    pub fn read(&self, region: &RgbImage) -> IconRead {
        if mean_luma(region) < self.config.empty_luma {
            return IconRead::Empty;
        }

        let matches = self.matcher.match_region(region, None);
        let Some(best) = matches.first() else {
            return IconRead::Unreadable;
        };
        if best.score < self.config.score_floor {
            return IconRead::Unreadable;
        }

        let label = best.label.strip_prefix("icon_").unwrap_or(&best.label);
        if let Some(second) = matches.get(1) {
            if best.score - second.score <= self.config.twin_epsilon {
                let other = second.label.strip_prefix("icon_").unwrap_or(&second.label);
                if let Some(rule) = self.twin_rule(label, other) {
                    return IconRead::Icon(self.resolve_twin(region, rule));
                }
            }
        }
        IconRead::Icon(label.to_string())
    }

    fn twin_rule(&self, a: &str, b: &str) -> Option<&TwinRule> {
        self.config.twins.iter().find(|rule| {
            (rule.warm == a && rule.cool == b) || (rule.warm == b && rule.cool == a)
        })
    }

    fn resolve_twin(&self, region: &RgbImage, rule: &TwinRule) -> String {
        let n = (region.width() * region.height()).max(1) as f64;
        let warm = region.pixels().filter(|p| is_warm(p)).count() as f64 / n;
        if warm >= self.config.warm_ratio_min {
            rule.warm.clone()
        } else {
            rule.cool.clone()
        }
    }
}
