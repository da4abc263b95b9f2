//! Screen-type classification.
//!
//! Raw classification is a cheap rule cascade over three global signals
//! measured on the play area (mean luma, warm-pixel ratio, blue-pixel
//! ratio) plus the luma of the HUD strip. The raw class is then passed
//! through hysteresis so a single misclassified frame cannot flip the
//! output; the one exception is a positive dungeon-level readout, which
//! forces `Dungeon` immediately.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::ScreenType;

use crate::util::{luma, mean_luma};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Consecutive raw classifications required before the output changes.
    pub hysteresis_frames: u32,
    /// Play-area luma at or below which the frame is a scroll/fade.
    pub transition_luma_max: f64,
    /// HUD-strip luma below which the HUD is considered absent
    /// (inventory subscreen scrolled over it).
    pub hud_dark_max: f64,
    /// Warm ratio above which a dark play area is the death flash.
    pub death_warm_min: f64,
    pub death_luma_max: f64,
    /// Warm ratio above which a bright play area is the title screen.
    pub title_warm_min: f64,
    pub title_luma_min: f64,
    /// Blue ratio above which the play area is dungeon walls.
    pub dungeon_blue_min: f64,
    /// Play-area luma at or above which an outdoor screen is assumed.
    pub overworld_luma_min: f64,
    /// Play-area luma at or below which an indoor cave is assumed.
    pub cave_luma_max: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            hysteresis_frames: 2,
            transition_luma_max: 10.0,
            hud_dark_max: 12.0,
            death_warm_min: 0.30,
            death_luma_max: 60.0,
            title_warm_min: 0.35,
            title_luma_min: 50.0,
            dungeon_blue_min: 0.15,
            overworld_luma_min: 70.0,
            cave_luma_max: 45.0,
        }
    }
}

/// Global colour statistics of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub play_luma: f64,
    /// Fraction of play-area pixels that are strongly red-dominant.
    pub warm_ratio: f64,
    /// Fraction of play-area pixels that are strongly blue-dominant.
    pub blue_ratio: f64,
    pub hud_luma: f64,
}

impl Signals {
    pub fn measure(play_area: &RgbImage, hud_strip: &RgbImage) -> Self {
        let n = (play_area.width() * play_area.height()).max(1) as f64;
        let mut warm = 0u32;
        let mut blue = 0u32;
        for p in play_area.pixels() {
            let [r, g, b] = p.0;
            if r >= 100 && r as i32 - b as i32 >= 40 && r as i32 - g as i32 >= 24 {
                warm += 1;
            } else if b >= 100 && b as i32 - r as i32 >= 40 {
                blue += 1;
            }
        }
        Self {
            play_luma: mean_luma(play_area),
            warm_ratio: warm as f64 / n,
            blue_ratio: blue as f64 / n,
            hud_luma: mean_luma(hud_strip),
        }
    }
}

/// Hysteresis-smoothed screen classifier. One per pipeline.
#[derive(Debug, Clone)]
pub struct ScreenClassifier {
    config: ClassifierConfig,
    current: ScreenType,
    candidate: Option<(ScreenType, u32)>,
}

impl ScreenClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            current: ScreenType::Unknown,
            candidate: None,
        }
    }

    /// Map one frame's signals to a raw class, before hysteresis. The rule
    /// order is part of the contract: darkness trumps colour, colour trumps
    /// brightness banding.
    pub fn resolve(&self, signals: &Signals) -> ScreenType {
        let c = &self.config;
        if signals.play_luma <= c.transition_luma_max {
            return ScreenType::Transition;
        }
        if signals.hud_luma <= c.hud_dark_max {
            return ScreenType::Subscreen;
        }
        if signals.warm_ratio >= c.death_warm_min && signals.play_luma <= c.death_luma_max {
            return ScreenType::Death;
        }
        if signals.warm_ratio >= c.title_warm_min && signals.play_luma >= c.title_luma_min {
            return ScreenType::Title;
        }
        if signals.blue_ratio >= c.dungeon_blue_min {
            return ScreenType::Dungeon;
        }
        if signals.play_luma >= c.overworld_luma_min {
            return ScreenType::Overworld;
        }
        if signals.play_luma <= c.cave_luma_max {
            return ScreenType::Cave;
        }
        ScreenType::Unknown
    }

    /// Feed one frame. `dungeon_level` is the HUD level readout for the same
    /// frame; any positive reading overrides the colour heuristics outright,
    /// since the HUD text is far more reliable than play-area statistics.
    pub fn observe(&mut self, signals: &Signals, dungeon_level: Option<u8>) -> ScreenType {
        if matches!(dungeon_level, Some(level) if level > 0) {
            self.current = ScreenType::Dungeon;
            self.candidate = None;
            return self.current;
        }

        let raw = self.resolve(signals);
        if raw == self.current {
            self.candidate = None;
            return self.current;
        }

        let count = match self.candidate.take() {
            Some((class, count)) if class == raw => count + 1,
            _ => 1,
        };
        if count >= self.config.hysteresis_frames {
            tracing::debug!(prev = ?self.current, next = ?raw, "screen type changed");
            self.current = raw;
        } else {
            self.candidate = Some((raw, count));
        }
        self.current
    }

    pub fn current(&self) -> ScreenType {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = ScreenType::Unknown;
        self.candidate = None;
    }
}

/// Whether one pixel reads as the warm life-indicator colour. Used by the
/// hearts and inventory readers; kept next to the signal definition so the
/// warm criterion has a single home.
pub fn is_warm(p: &image::Rgb<u8>) -> bool {
    let [r, g, b] = p.0;
    r >= 100 && r as i32 - b as i32 >= 40 && r as i32 - g as i32 >= 24 && luma(p) >= 40.0
}
