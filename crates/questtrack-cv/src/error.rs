//! Configuration-error taxonomy.
//!
//! Per-frame processing never returns errors: low-confidence reads become
//! absent fields and missing templates disable their reader. These variants
//! only surface at startup or on an explicit profile reload.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The only fatal startup condition: the template directory itself is
    /// missing, so the entire field-reader class cannot be built.
    #[error("template directory not found: {0}")]
    MissingTemplateDir(PathBuf),

    #[error("calibration profile has an empty crop rectangle")]
    EmptyCrop,

    #[error("calibration landmark `{0}` has an empty rectangle")]
    EmptyLandmark(String),
}
