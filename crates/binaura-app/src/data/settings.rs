//! Application settings management
//!
//! The user's last configuration, restored on the next launch.

use crate::config::files::SETTINGS;
use crate::config::share::DEFAULT_BASE;
use crate::data::storage;
use crate::error::Result;
use binaura::audio::background::AmbientTrack;
use binaura::audio::mixer::clamp_volume;
use binaura::audio::types::validate_frequency;
use binaura::config::audio::DEFAULT_VOLUME;
use binaura::config::timer::{DEFAULT_MINUTES, MAX_MINUTES};
use binaura::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file format version for migrations
const SETTINGS_VERSION: u32 = 1;

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// File format version
    #[serde(default = "default_version")]
    pub version: u32,

    // === Tones ===
    #[serde(default = "default_left")]
    pub left_hz: f64,

    #[serde(default = "default_right")]
    pub right_hz: f64,

    /// Master volume (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    // === Session ===
    /// Session length; 0 runs until stopped
    #[serde(default = "default_timer_minutes")]
    pub timer_minutes: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<AmbientTrack>,

    // === Sharing ===
    /// Page that share links point at
    #[serde(default = "default_share_base")]
    pub share_base: String,

    /// Where feedback is posted; feedback is dropped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_endpoint: Option<String>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_left() -> f64 {
    200.0
}

fn default_right() -> f64 {
    196.0
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_timer_minutes() -> u32 {
    DEFAULT_MINUTES
}

fn default_share_base() -> String {
    DEFAULT_BASE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            left_hz: default_left(),
            right_hz: default_right(),
            volume: default_volume(),
            timer_minutes: default_timer_minutes(),
            background: None,
            share_base: default_share_base(),
            feedback_endpoint: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from default storage location
    pub fn load() -> Result<Self> {
        Ok(storage::load::<Settings>(SETTINGS)?
            .unwrap_or_default()
            .sanitized())
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(storage::load_from::<Settings>(path)?
            .unwrap_or_default()
            .sanitized())
    }

    /// Save settings to default storage location
    pub fn save(&self) -> Result<()> {
        storage::save(SETTINGS, self)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        storage::save_to(path, self)
    }

    /// Replace out-of-range values from a hand-edited file with defaults
    fn sanitized(mut self) -> Self {
        if validate_frequency(self.left_hz).is_err() || validate_frequency(self.right_hz).is_err() {
            log::warn!(
                "Ignoring invalid saved frequencies {} / {}",
                self.left_hz,
                self.right_hz
            );
            self.left_hz = default_left();
            self.right_hz = default_right();
        }
        self.set_volume(self.volume);
        self.set_timer_minutes(self.timer_minutes);
        self
    }

    /// Set both frequencies; invalid values leave both unchanged
    pub fn set_frequencies(&mut self, left_hz: f64, right_hz: f64) -> Result<()> {
        validate_frequency(left_hz)?;
        validate_frequency(right_hz)?;
        self.left_hz = left_hz;
        self.right_hz = right_hz;
        Ok(())
    }

    /// Set volume (clamped to 0.0 - 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    /// Set the session length (clamped to the slider range)
    pub fn set_timer_minutes(&mut self, minutes: u32) {
        self.timer_minutes = minutes.min(MAX_MINUTES);
    }

    /// Controller configuration seeded from these settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            left_hz: self.left_hz,
            right_hz: self.right_hz,
            volume: self.volume,
            timer_secs: self.timer_minutes as u64 * 60,
            background: self.background,
            ..SessionConfig::default()
        }
    }
}
