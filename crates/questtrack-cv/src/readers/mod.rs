//! Field readers: everything that turns calibrated pixel regions into raw
//! field values.
//!
//! Template-driven readers are optional. A missing template family disables
//! just that reader, warned once per entity when the readers are built;
//! every other field keeps flowing.

pub mod counter;
pub mod floor;
pub mod hearts;
pub mod icon;
pub mod inventory;
pub mod minimap;
pub mod pedestal;

pub use counter::{CounterConfig, CounterReader};
pub use floor::{FloorConfig, FloorItemDetector};
pub use hearts::{HeartsConfig, HeartsReader};
pub use icon::{IconConfig, IconRead, IconReader, TwinRule};
pub use inventory::{TriforceConfig, TriforceReader};
pub use minimap::{MinimapConfig, MinimapReader};
pub use pedestal::{PedestalConfig, PedestalReader};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::{RawFrameObservation, ScreenType};

use crate::calibrate::{CalibratedFrame, RegionCalibrator};
use crate::classify::{ClassifierConfig, ScreenClassifier, Signals};
use crate::matcher::MatcherConfig;
use crate::template::TemplateSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadersConfig {
    pub matcher: MatcherConfig,
    pub classifier: ClassifierConfig,
    pub counter: CounterConfig,
    pub icon: IconConfig,
    pub hearts: HeartsConfig,
    pub floor: FloorConfig,
    pub minimap: MinimapConfig,
    pub triforce: TriforceConfig,
    pub pedestal: PedestalConfig,
}

/// All per-entity readers plus the screen classifier, assembled from one
/// template set.
pub struct FieldReaders {
    counter: Option<CounterReader>,
    icon: Option<IconReader>,
    floor: Option<FloorItemDetector>,
    pedestal: Option<PedestalReader>,
    hearts: HeartsReader,
    minimap: MinimapReader,
    triforce: TriforceReader,
    classifier: ScreenClassifier,
}

impl FieldReaders {
    pub fn new(entity: &str, templates: &TemplateSet, config: &ReadersConfig) -> Self {
        let counter = CounterReader::from_templates(
            templates,
            config.matcher.clone(),
            config.counter.clone(),
        );
        if counter.is_none() {
            tracing::warn!(entity, "no digit templates, counter fields disabled");
        }
        let icon = IconReader::from_templates(
            templates,
            config.matcher.clone(),
            config.icon.clone(),
        );
        if icon.is_none() {
            tracing::warn!(entity, "no icon templates, item-box fields disabled");
        }
        let floor = FloorItemDetector::from_templates(templates, config.floor.clone());
        if floor.is_none() {
            tracing::warn!(entity, "no floor templates, floor-item detection disabled");
        }
        let pedestal = PedestalReader::from_templates(templates, config.pedestal.clone());
        if pedestal.is_none() {
            tracing::warn!(entity, "no floor templates, pedestal reading disabled");
        }

        Self {
            counter,
            icon,
            floor,
            pedestal,
            hearts: HeartsReader::new(config.hearts.clone()),
            minimap: MinimapReader::new(config.minimap.clone()),
            triforce: TriforceReader::new(config.triforce.clone()),
            classifier: ScreenClassifier::new(config.classifier.clone()),
        }
    }

    /// Read every field off one calibrated frame into a raw observation.
    /// Unreadable fields stay `None`; the stability gate deals with the
    /// rest.
    pub fn assemble(
        &mut self,
        calibrator: &RegionCalibrator,
        frame: &CalibratedFrame<'_>,
        frame_index: u64,
        timestamp_ms: u64,
    ) -> RawFrameObservation {
        let mut obs = RawFrameObservation::at(frame_index, timestamp_ms);

        // Dungeon-level text is read before classification so a positive
        // readout can override the colour heuristics.
        obs.dungeon_level = self
            .counter
            .as_ref()
            .zip(calibrator.extract(frame, "level_digit"))
            .and_then(|(counter, tile)| counter.read_level(&tile));

        let screen = self.classify(calibrator, frame, obs.dungeon_level);
        obs.screen_type = Some(screen);

        if screen.is_gameplay() {
            self.read_hud(calibrator, frame, &mut obs);
            obs.map_position = calibrator
                .extract(frame, "minimap")
                .and_then(|region| self.minimap.read(&region, screen));
            if let Some(floor) = self.floor.as_mut() {
                obs.floor_items = calibrator
                    .extract(frame, "play_area")
                    .map(|region| floor.detect(&region));
            }
        }

        if screen == ScreenType::Dungeon {
            if let Some(pedestal) = self.pedestal.as_ref() {
                obs.pedestal_item = calibrator
                    .extract(frame, "pedestal")
                    .and_then(|zone| pedestal.read(&zone));
            }
        }

        if screen == ScreenType::Subscreen {
            obs.triforce = calibrator
                .extract(frame, "triforce")
                .map(|region| self.triforce.read(&region));
        }

        obs
    }

    fn classify(
        &mut self,
        calibrator: &RegionCalibrator,
        frame: &CalibratedFrame<'_>,
        dungeon_level: Option<u8>,
    ) -> ScreenType {
        let play = calibrator.extract(frame, "play_area");
        let hud = calibrator.extract(frame, "minimap");
        match (play, hud) {
            (Some(play), Some(hud)) => {
                let signals = Signals::measure(&play, &hud);
                self.classifier.observe(&signals, dungeon_level)
            }
            _ => self.classifier.current(),
        }
    }

    fn read_hud(
        &mut self,
        calibrator: &RegionCalibrator,
        frame: &CalibratedFrame<'_>,
        obs: &mut RawFrameObservation,
    ) {
        obs.hearts = calibrator
            .extract(frame, "hearts")
            .and_then(|region| self.hearts.read(&region));

        if let Some(counter) = self.counter.as_ref() {
            obs.rupees = Self::two_tiles(calibrator, frame, "rupees_tens", "rupees_ones")
                .and_then(|(tens, ones)| counter.read_count(&tens, ones.as_ref()));
            obs.bombs = Self::two_tiles(calibrator, frame, "bombs_tens", "bombs_ones")
                .and_then(|(tens, ones)| counter.read_count(&tens, ones.as_ref()));
            obs.keys = Self::two_tiles(calibrator, frame, "keys_tens", "keys_ones")
                .and_then(|(tens, ones)| counter.read_keys(&tens, ones.as_ref()));
        }

        if let Some(icon) = self.icon.as_ref() {
            obs.b_item = calibrator
                .extract(frame, "b_item")
                .and_then(|region| match icon.read(&region) {
                    IconRead::Empty => Some(None),
                    IconRead::Icon(label) => Some(Some(label)),
                    IconRead::Unreadable => None,
                });
            obs.sword_level = calibrator
                .extract(frame, "sword")
                .and_then(|region| Self::sword_level(icon, &region));
        }
    }

    fn two_tiles(
        calibrator: &RegionCalibrator,
        frame: &CalibratedFrame<'_>,
        tens: &str,
        ones: &str,
    ) -> Option<(RgbImage, Option<RgbImage>)> {
        let tens = calibrator.extract(frame, tens)?;
        Some((tens, calibrator.extract(frame, ones)))
    }

    /// Sword box: empty box is level 0, `icon_sword_<n>` is level n.
    fn sword_level(icon: &IconReader, region: &RgbImage) -> Option<u8> {
        match icon.read(region) {
            IconRead::Empty => Some(0),
            IconRead::Icon(label) => label.strip_prefix("sword_")?.parse().ok(),
            IconRead::Unreadable => None,
        }
    }

    pub fn reset(&mut self) {
        self.classifier.reset();
        if let Some(floor) = self.floor.as_mut() {
            floor.reset();
        }
    }

    pub fn screen_type(&self) -> ScreenType {
        self.classifier.current()
    }
}
