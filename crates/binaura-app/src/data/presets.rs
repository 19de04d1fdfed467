//! Custom preset store
//!
//! User-saved left/right pairs, persisted as JSON. The store only ever
//! appends; a later preset with the same name shadows the earlier one on
//! lookup.

use crate::config::files::CUSTOM_PRESETS;
use crate::data::storage;
use crate::error::{AppError, Result};
use binaura::audio::types::{validate_frequency, BeatDescriptor};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Custom presets file format version for migrations
const PRESETS_VERSION: u32 = 1;

/// A saved frequency pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPreset {
    pub name: String,
    pub left_hz: f64,
    pub right_hz: f64,
}

impl CustomPreset {
    /// Create a preset; the name must be non-blank and both frequencies valid
    pub fn new(name: &str, left_hz: f64, right_hz: f64) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Config("Preset name cannot be empty".to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            left_hz: validate_frequency(left_hz)?,
            right_hz: validate_frequency(right_hz)?,
        })
    }

    pub fn beat(&self) -> BeatDescriptor {
        BeatDescriptor::new(self.left_hz, self.right_hz)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PresetsFile {
    version: u32,
    presets: Vec<CustomPreset>,
}

/// Saved presets, in the order they were added
#[derive(Debug, Default)]
pub struct PresetStore {
    presets: Vec<CustomPreset>,
    dirty: bool,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load presets from default storage location
    pub fn load() -> Result<Self> {
        Self::load_from(&storage::data_path(CUSTOM_PRESETS)?)
    }

    /// Load presets from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let presets = storage::load_from::<PresetsFile>(path)?
            .map(|file| file.presets)
            .unwrap_or_default();
        Ok(Self {
            presets,
            dirty: false,
        })
    }

    /// Save presets to default storage location
    pub fn save(&mut self) -> Result<()> {
        self.save_to(&storage::data_path(CUSTOM_PRESETS)?)
    }

    /// Save presets to a specific path; a no-op when nothing changed
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = PresetsFile {
            version: PRESETS_VERSION,
            presets: self.presets.clone(),
        };
        storage::save_to(path, &file)?;
        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Append a preset
    pub fn add(&mut self, preset: CustomPreset) {
        log::info!("Saved preset {} ({})", preset.name, preset.beat());
        self.presets.push(preset);
        self.dirty = true;
    }

    /// Most recently saved preset with this name (case-insensitive)
    pub fn find(&self, name: &str) -> Result<&CustomPreset> {
        let name = name.trim();
        self.presets
            .iter()
            .rev()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AppError::NotFound(format!("preset '{}'", name)))
    }

    pub fn list(&self) -> &[CustomPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
