//! Per-entity frame pipeline and the registry that owns one per entity.
//!
//! A pipeline is strictly synchronous: one frame in, a (possibly empty)
//! ordered event batch out. Nothing per-frame returns `Err`; unreadable
//! fields are absent and the stable state simply persists. Calibration
//! reloads and resets go through `&mut` methods, so they can only land
//! between frames.

use std::collections::HashMap;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::{
    Anomaly, Coordinator, GameEvent, PendingSnapshot, StabilityConfig, StabilityGate,
    StableGameState, TrackerConfig,
};

use crate::Result;
use crate::calibrate::{CalibrationProfile, RegionCalibrator};
use crate::readers::{FieldReaders, ReadersConfig};
use crate::template::TemplateSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub readers: ReadersConfig,
    pub stability: StabilityConfig,
    pub trackers: TrackerConfig,
}

/// The full extraction stack for one tracked entity.
pub struct FramePipeline {
    profile: CalibrationProfile,
    calibrator: RegionCalibrator,
    readers: FieldReaders,
    gate: StabilityGate,
    state: StableGameState,
    coordinator: Coordinator,
    event_queue: Vec<GameEvent>,
}

impl FramePipeline {
    pub fn new(
        entity: impl Into<String>,
        profile: CalibrationProfile,
        templates: &TemplateSet,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let entity = entity.into();
        let calibrator = RegionCalibrator::from_profile(&profile)?;
        Ok(Self {
            calibrator,
            readers: FieldReaders::new(&entity, templates, &config.readers),
            gate: StabilityGate::new(config.stability.clone()),
            state: StableGameState::default(),
            coordinator: Coordinator::new(entity, &config.trackers),
            event_queue: Vec::new(),
            profile,
        })
    }

    /// Process one captured frame. Duplicate or out-of-order frame indices
    /// are fine; every call is treated as a fresh observation.
    pub fn process_frame(
        &mut self,
        frame: &RgbImage,
        frame_index: u64,
        timestamp_ms: u64,
    ) -> Vec<GameEvent> {
        let prepared = self.calibrator.prepare(frame);
        let obs = self
            .readers
            .assemble(&self.calibrator, &prepared, frame_index, timestamp_ms);

        let prev = self.state.clone();
        let changed = self.gate.apply(&obs, &mut self.state);
        if !changed.is_empty() {
            tracing::debug!(
                entity = self.coordinator.entity(),
                frame_index,
                ?changed,
                "stable state changed"
            );
        }

        let events = self
            .coordinator
            .tick(&prev, &self.state, frame_index, timestamp_ms);
        self.event_queue.extend(events.iter().cloned());
        events
    }

    pub fn stable_state(&self) -> &StableGameState {
        &self.state
    }

    pub fn pending_fields(&self) -> Vec<PendingSnapshot> {
        self.gate.pending_fields(&self.state)
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        self.coordinator.anomalies()
    }

    /// Events accumulated since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.event_queue)
    }

    /// Apply an updated calibration profile between frames. Landmarks merge
    /// by name into the current profile; crop and grid offset are replaced.
    pub fn reload_profile(&mut self, update: CalibrationProfile) -> Result<()> {
        self.profile.crop = update.crop;
        self.profile.grid_offset = update.grid_offset;
        self.profile.confidence = update.confidence;
        self.profile.provenance = update.provenance;
        for landmark in update.landmarks {
            self.profile.merge_landmark(landmark);
        }
        self.calibrator = RegionCalibrator::from_profile(&self.profile)?;
        Ok(())
    }

    /// Clear stable state, pending candidates and tracker machines. The
    /// calibration profile and templates survive.
    pub fn reset(&mut self) {
        self.state = StableGameState::default();
        self.gate.reset();
        self.readers.reset();
        self.coordinator.reset();
        self.event_queue.clear();
    }
}

/// All pipelines, keyed by entity id, over one shared template set.
pub struct PipelineRegistry {
    templates: TemplateSet,
    config: PipelineConfig,
    pipelines: HashMap<String, FramePipeline>,
}

impl PipelineRegistry {
    pub fn new(templates: TemplateSet, config: PipelineConfig) -> Self {
        Self {
            templates,
            config,
            pipelines: HashMap::new(),
        }
    }

    /// Create (or replace) the pipeline for one entity.
    pub fn register(
        &mut self,
        entity: impl Into<String>,
        profile: CalibrationProfile,
    ) -> Result<()> {
        let entity = entity.into();
        let pipeline =
            FramePipeline::new(entity.clone(), profile, &self.templates, &self.config)?;
        self.pipelines.insert(entity, pipeline);
        Ok(())
    }

    pub fn get_mut(&mut self, entity: &str) -> Option<&mut FramePipeline> {
        self.pipelines.get_mut(entity)
    }

    pub fn stable_state(&self, entity: &str) -> Option<&StableGameState> {
        self.pipelines.get(entity).map(|p| p.stable_state())
    }

    pub fn pending_fields(&self, entity: &str) -> Option<Vec<PendingSnapshot>> {
        self.pipelines.get(entity).map(|p| p.pending_fields())
    }

    pub fn drain_events(&mut self, entity: &str) -> Vec<GameEvent> {
        self.pipelines
            .get_mut(entity)
            .map(|p| p.drain_events())
            .unwrap_or_default()
    }

    /// Reset one entity only; every other pipeline is untouched.
    pub fn reset(&mut self, entity: &str) -> bool {
        match self.pipelines.get_mut(entity) {
            Some(pipeline) => {
                pipeline.reset();
                true
            }
            None => false,
        }
    }

    pub fn reload_profile(&mut self, entity: &str, profile: CalibrationProfile) -> Result<()> {
        match self.pipelines.get_mut(entity) {
            Some(pipeline) => pipeline.reload_profile(profile),
            None => Err(anyhow::anyhow!("unknown entity: {entity}")),
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn registry() -> PipelineRegistry {
        PipelineRegistry::new(TemplateSet::from_templates(Vec::new()), PipelineConfig::default())
    }

    fn overworld_frame() -> RgbImage {
        RgbImage::from_pixel(256, 240, Rgb([120, 180, 90]))
    }

    #[test]
    fn test_reset_is_per_entity() {
        let mut reg = registry();
        reg.register("p1", CalibrationProfile::full_frame(256, 240)).unwrap();
        reg.register("p2", CalibrationProfile::full_frame(256, 240)).unwrap();

        let frame = overworld_frame();
        for i in 0..4 {
            reg.get_mut("p1").unwrap().process_frame(&frame, i, i * 250);
            reg.get_mut("p2").unwrap().process_frame(&frame, i, i * 250);
        }
        assert!(reg.stable_state("p1").unwrap().screen_type.is_gameplay());
        assert!(reg.stable_state("p2").unwrap().screen_type.is_gameplay());

        assert!(reg.reset("p1"));
        assert!(!reg.stable_state("p1").unwrap().screen_type.is_gameplay());
        assert!(reg.stable_state("p2").unwrap().screen_type.is_gameplay());
    }

    #[test]
    fn test_unknown_entity() {
        let mut reg = registry();
        assert!(reg.stable_state("nobody").is_none());
        assert!(!reg.reset("nobody"));
        assert!(reg
            .reload_profile("nobody", CalibrationProfile::full_frame(256, 240))
            .is_err());
        assert!(reg.drain_events("nobody").is_empty());
    }

    #[test]
    fn test_duplicate_frame_indices_are_tolerated() {
        let mut reg = registry();
        reg.register("p1", CalibrationProfile::full_frame(256, 240)).unwrap();
        let frame = overworld_frame();
        let p = reg.get_mut("p1").unwrap();
        for _ in 0..5 {
            p.process_frame(&frame, 7, 1750);
        }
        assert!(p.stable_state().screen_type.is_gameplay());
    }

    #[test]
    fn test_drain_events_empties_the_queue() {
        let mut reg = registry();
        reg.register("p1", CalibrationProfile::full_frame(256, 240)).unwrap();
        let frame = overworld_frame();
        for i in 0..4 {
            reg.get_mut("p1").unwrap().process_frame(&frame, i, i * 250);
        }
        // A quiet stream produces no events, and draining stays empty.
        assert!(reg.drain_events("p1").is_empty());
        assert!(reg.drain_events("p1").is_empty());
    }

    #[test]
    fn test_reload_profile_merges_landmarks_by_name() {
        use crate::bbox::Rect;
        use crate::calibrate::{FieldRegion, Landmark};

        let mut reg = registry();
        let mut profile = CalibrationProfile::full_frame(256, 240);
        profile.merge_landmark(Landmark {
            name: "hearts".to_string(),
            rect: Rect::new(1, 1, 64, 16),
        });
        reg.register("p1", profile).unwrap();

        let mut update = CalibrationProfile::full_frame(256, 240);
        update.merge_landmark(Landmark {
            name: "hearts".to_string(),
            rect: Rect::new(5, 5, 64, 16),
        });
        reg.reload_profile("p1", update).unwrap();

        let p = reg.get_mut("p1").unwrap();
        assert_eq!(
            p.calibrator.region_kind("hearts"),
            Some(&FieldRegion::Landmark(Rect::new(5, 5, 64, 16)))
        );
    }
}
