//! Data persistence
//!
//! Handles custom presets and settings.

pub mod presets;
pub mod settings;
pub mod storage;

// Re-export common types
pub use presets::{CustomPreset, PresetStore};
pub use settings::Settings;
pub use storage::{config_dir, data_path, ensure_config_dir, load, save};
