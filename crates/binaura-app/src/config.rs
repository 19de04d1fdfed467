//! Configuration constants for binaura app services

/// Application metadata
pub mod app {
    /// Application name (used for config directory, etc.)
    pub const NAME: &str = "binaura";
}

/// Persisted file names
pub mod files {
    /// User settings
    pub const SETTINGS: &str = "settings.json";

    /// Saved left/right pairs
    pub const CUSTOM_PRESETS: &str = "custom_presets.json";

    /// Log output of the terminal player
    pub const LOG: &str = "binaura.log";
}

/// Share link configuration
pub mod share {
    /// Page the share link points at; only its query is rewritten
    pub const DEFAULT_BASE: &str = "https://binaura.app/";

    /// Query parameter carrying the left frequency
    pub const LEFT_PARAM: &str = "l";

    /// Query parameter carrying the right frequency
    pub const RIGHT_PARAM: &str = "r";
}
