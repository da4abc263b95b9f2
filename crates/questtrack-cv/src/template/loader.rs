//! Template loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::Result;
use crate::error::ConfigError;

use super::Template;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// All templates found in the asset directory, loaded once at startup and
/// shared read-only by every pipeline.
#[derive(Debug, Default)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    /// Load every supported image in `dir`. A missing directory is the one
    /// fatal configuration error; individually unreadable files are skipped
    /// with a warning so one corrupt asset cannot take the pipeline down.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConfigError::MissingTemplateDir(dir.to_path_buf()).into());
        }

        let mut templates = Vec::new();
        let entries =
            fs::read_dir(dir).with_context(|| format!("failed to read directory: {dir:?}"))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !Self::is_supported(&path) {
                continue;
            }
            let Some(stem) = path.file_stem() else {
                continue;
            };
            let name = stem.to_string_lossy().to_lowercase();
            match image::open(&path) {
                Ok(img) => templates.push(Template::new(name, img.to_rgb8())),
                Err(err) => {
                    tracing::warn!("skipping unreadable template {path:?}: {err}");
                }
            }
        }

        // Deterministic iteration order regardless of filesystem order.
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { templates })
    }

    /// Build a set directly from in-memory templates (tests, embedding).
    pub fn from_templates(mut templates: Vec<Template>) -> Self {
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Self { templates }
    }

    fn is_supported(path: &PathBuf) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                SUPPORTED_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Every template whose name starts with `prefix`, e.g. `digit_` or
    /// `floor_`.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&Template> {
        self.templates
            .iter()
            .filter(|t| t.name.starts_with(prefix))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }
}
