//! Built-in frequency presets

use crate::audio::types::BeatDescriptor;

/// A named left/right pair; the beat is derived, never stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub left_hz: f64,
    pub right_hz: f64,
    /// Brainwave band the beat targets
    pub description: &'static str,
}

impl Preset {
    const fn new(name: &'static str, left_hz: f64, right_hz: f64, description: &'static str) -> Self {
        Self {
            name,
            left_hz,
            right_hz,
            description,
        }
    }

    pub fn beat(&self) -> BeatDescriptor {
        BeatDescriptor::new(self.left_hz, self.right_hz)
    }
}

pub static BUILTIN: [Preset; 10] = [
    Preset::new("Deep Sleep", 200.0, 196.0, "Delta Wave"),
    Preset::new("Relaxation", 432.0, 426.0, "Theta"),
    Preset::new("Meditation", 528.0, 520.0, "Alpha"),
    Preset::new("Focus", 440.0, 450.0, "Beta"),
    Preset::new("Study Mode", 360.0, 380.0, "Low Gamma"),
    Preset::new("Lucid Dream", 225.0, 232.5, "Theta + Gamma"),
    Preset::new("Anxiety Relief", 174.0, 178.0, "Deep Delta"),
    Preset::new("Energy Boost", 400.0, 420.0, "High Beta"),
    Preset::new("Creativity", 417.0, 425.0, "Alpha Flow"),
    Preset::new("Chakra Balance", 432.0, 432.0, "Monoral 432Hz"),
];

/// All built-in presets in display order
pub fn all() -> &'static [Preset] {
    &BUILTIN
}

/// Look up a preset by name, ignoring case and surrounding whitespace
pub fn find(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    BUILTIN.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
