//! Questtrack vision layer: templates, matching, calibration, screen
//! classification and field readers, wired into a per-entity frame
//! pipeline.
//!
//! The output of this crate is a stream of [`questtrack_core::GameEvent`]s
//! plus a queryable [`questtrack_core::StableGameState`] per entity. All
//! recognition is classical and deterministic: binarized shape matching
//! for HUD glyphs, full-colour window similarity for play-area sprites.

pub mod bbox;
pub mod calibrate;
pub mod classify;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod readers;
pub mod template;
pub mod util;

pub use bbox::{BBox, Detections, Rect};
pub use calibrate::{CalibratedFrame, CalibrationProfile, FieldRegion, Landmark, RegionCalibrator};
pub use classify::{ClassifierConfig, ScreenClassifier, Signals};
pub use error::ConfigError;
pub use matcher::{BinaryShapeMatcher, MatcherConfig, ShapeMatch};
pub use pipeline::{FramePipeline, PipelineConfig, PipelineRegistry};
pub use readers::{FieldReaders, ReadersConfig};
pub use template::{Template, TemplateSet};

/// Convenience alias used throughout the crate.
pub type Result<T> = anyhow::Result<T>;
