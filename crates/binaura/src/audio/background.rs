//! Background (ambient) track player
//!
//! Loops one decorative clip next to the tones at a fixed, attenuated
//! volume. Failures here never reach the caller: they are logged and the
//! session carries on without ambience.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::background::VOLUME;
use crate::error::BeatError;

use super::graph::AmbientOutput;
use super::types::TrackLocator;

/// The selectable ambient tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbientTrack {
    Rain,
    Ocean,
    Forest,
    WhiteNoise,
}

impl AmbientTrack {
    pub const ALL: [AmbientTrack; 4] = [
        AmbientTrack::Rain,
        AmbientTrack::Ocean,
        AmbientTrack::Forest,
        AmbientTrack::WhiteNoise,
    ];

    /// Stable identifier used in settings and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            AmbientTrack::Rain => "rain",
            AmbientTrack::Ocean => "ocean",
            AmbientTrack::Forest => "forest",
            AmbientTrack::WhiteNoise => "white-noise",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            AmbientTrack::Rain => "Rain",
            AmbientTrack::Ocean => "Ocean",
            AmbientTrack::Forest => "Forest",
            AmbientTrack::WhiteNoise => "White Noise",
        }
    }

    /// Next entry in a none → rain → … → white-noise → none cycle
    pub fn cycle(current: Option<AmbientTrack>) -> Option<AmbientTrack> {
        match current {
            None => Some(AmbientTrack::Rain),
            Some(AmbientTrack::Rain) => Some(AmbientTrack::Ocean),
            Some(AmbientTrack::Ocean) => Some(AmbientTrack::Forest),
            Some(AmbientTrack::Forest) => Some(AmbientTrack::WhiteNoise),
            Some(AmbientTrack::WhiteNoise) => None,
        }
    }
}

impl fmt::Display for AmbientTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for AmbientTrack {
    type Err = BeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rain" => Ok(AmbientTrack::Rain),
            "ocean" => Ok(AmbientTrack::Ocean),
            "forest" => Ok(AmbientTrack::Forest),
            "white-noise" | "whitenoise" | "white_noise" => Ok(AmbientTrack::WhiteNoise),
            other => Err(BeatError::UnknownTrack(other.to_string())),
        }
    }
}

/// Maps ambient tracks to the place their audio lives
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    entries: HashMap<AmbientTrack, TrackLocator>,
}

impl Default for TrackCatalog {
    /// Free public clips
    fn default() -> Self {
        Self::empty()
            .with(
                AmbientTrack::Rain,
                TrackLocator::Url("https://cdn.pixabay.com/download/audio/2022/05/13/audio_6c22e8f2a6.mp3?filename=rain-107357.mp3".into()),
            )
            .with(
                AmbientTrack::Ocean,
                TrackLocator::Url("https://cdn.pixabay.com/download/audio/2022/03/15/audio_46136d8d7e.mp3?filename=ocean-waves-112906.mp3".into()),
            )
            .with(
                AmbientTrack::Forest,
                TrackLocator::Url("https://cdn.pixabay.com/download/audio/2022/08/02/audio_671902420c.mp3?filename=forest-sounds-112939.mp3".into()),
            )
            .with(
                AmbientTrack::WhiteNoise,
                TrackLocator::Url("https://www.soundjay.com/misc/sounds/white-noise-10s.mp3".into()),
            )
    }
}

impl TrackCatalog {
    /// Catalog with no entries
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, track: AmbientTrack, locator: TrackLocator) -> Self {
        self.insert(track, locator);
        self
    }

    pub fn insert(&mut self, track: AmbientTrack, locator: TrackLocator) {
        self.entries.insert(track, locator);
    }

    pub fn resolve(&self, track: AmbientTrack) -> Option<&TrackLocator> {
        self.entries.get(&track)
    }
}

/// Plays one looping ambient clip at a time
pub struct BackgroundTrackPlayer {
    output: Box<dyn AmbientOutput>,
    catalog: TrackCatalog,
    current: Option<AmbientTrack>,
    volume: f32,
}

impl BackgroundTrackPlayer {
    pub fn new(output: Box<dyn AmbientOutput>, catalog: TrackCatalog) -> Self {
        Self {
            output,
            catalog,
            current: None,
            volume: VOLUME,
        }
    }

    /// Track currently requested from the output
    pub fn current(&self) -> Option<AmbientTrack> {
        self.current
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    /// Stop whatever is playing, then start looping `track`.
    ///
    /// Returns whether playback was started; failures are only logged.
    pub fn play(&mut self, track: AmbientTrack) -> bool {
        self.stop();

        let Some(locator) = self.catalog.resolve(track) else {
            log::warn!(
                "{}",
                BeatError::BackgroundUnavailable(format!("no source configured for {track}"))
            );
            return false;
        };

        match self.output.play_looped(locator, self.volume) {
            Ok(()) => {
                log::info!("Background track {} from {}", track, locator);
                self.current = Some(track);
                true
            }
            Err(e) => {
                log::warn!("Background track {} failed: {}", track, e);
                false
            }
        }
    }

    /// Like `play`, resolving a track identifier first
    pub fn play_id(&mut self, id: &str) -> bool {
        match id.parse::<AmbientTrack>() {
            Ok(track) => self.play(track),
            Err(e) => {
                self.stop();
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Halt and release the current clip
    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            self.output.stop();
        }
    }
}
