//! Playback session state
//!
//! The single session record owned by the controller, its configuration,
//! the read-only snapshot handed to frontends and the events it emits.

use std::fmt;
use std::time::Duration;

use crate::audio::background::AmbientTrack;
use crate::audio::types::{BeatDescriptor, ToneChannel};
use crate::config::{audio, fade, timer, visual};
use crate::error::Result;

use super::timer::format_mmss;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    FadingOut,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::FadingOut => write!(f, "Fading out"),
        }
    }
}

/// Fade-out timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeConfig {
    /// Length of the exponential gain ramp
    pub ramp: Duration,
    /// Delay from stop until the graph is torn down
    pub teardown_delay: Duration,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            ramp: Duration::from_secs_f64(fade::RAMP_SECS),
            teardown_delay: Duration::from_millis(fade::TEARDOWN_DELAY_MS),
        }
    }
}

/// Initial controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub left_hz: f64,
    pub right_hz: f64,
    pub volume: f32,
    /// Session length; zero runs until stopped
    pub timer_secs: u64,
    pub background: Option<AmbientTrack>,
    pub fade: FadeConfig,
    pub tick_period: Duration,
    pub frame_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            left_hz: 200.0,
            right_hz: 196.0,
            volume: audio::DEFAULT_VOLUME,
            timer_secs: timer::DEFAULT_MINUTES as u64 * 60,
            background: None,
            fade: FadeConfig::default(),
            tick_period: Duration::from_millis(timer::TICK_MS),
            frame_period: Duration::from_micros(visual::FRAME_PERIOD_MICROS),
        }
    }
}

/// The one live session record
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    /// Clock time of the most recent start
    pub started_at: Option<Duration>,
    pub left: ToneChannel,
    pub right: ToneChannel,
    pub volume: f32,
    pub background: Option<AmbientTrack>,
    pub remaining_secs: u64,
    /// Bumped on every start and teardown
    pub generation: u64,
}

impl PlaybackSession {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Ok(Self {
            state: PlaybackState::Idle,
            started_at: None,
            left: ToneChannel::left(config.left_hz)?,
            right: ToneChannel::right(config.right_hz)?,
            volume: config.volume,
            background: config.background,
            remaining_secs: config.timer_secs,
            generation: 0,
        })
    }

    pub fn beat(&self) -> BeatDescriptor {
        BeatDescriptor::from_channels(&self.left, &self.right)
    }
}

/// Read-only view of the session for frontends
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub left_hz: f64,
    pub right_hz: f64,
    pub beat_hz: f64,
    pub volume: f32,
    pub background: Option<AmbientTrack>,
    pub timer_secs: u64,
    pub remaining_secs: u64,
    pub live_channels: usize,
    pub started_at: Option<Duration>,
}

impl SessionSnapshot {
    /// Remaining time as MM:SS
    pub fn remaining_display(&self) -> String {
        format_mmss(self.remaining_secs)
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

/// Notifications from the controller
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StateChanged(PlaybackState),
    TimerTick(u64),
    TimerExpired,
    Error(String),
    BackgroundFailed(String),
}
