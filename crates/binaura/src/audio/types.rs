//! Shared audio types
//!
//! Pure data types used across the audio subsystem: tone channels, the
//! derived beat, and the scheduled parameter changes sent to a backend.

use std::fmt;
use std::path::PathBuf;

use crate::config::audio::{LEFT_PAN, RIGHT_PAN};
use crate::error::{BeatError, Result};

/// Reject non-positive or non-finite frequencies before they reach an oscillator
pub fn validate_frequency(hz: f64) -> Result<f64> {
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(BeatError::InvalidFrequency(hz))
    }
}

/// Stereo side of a tone channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// One sine oscillator and its stereo position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneChannel {
    frequency_hz: f64,
    pan: f32,
}

impl ToneChannel {
    /// Create a channel; the frequency must be positive and finite, pan is clamped to [-1, 1]
    pub fn new(frequency_hz: f64, pan: f32) -> Result<Self> {
        Ok(Self {
            frequency_hz: validate_frequency(frequency_hz)?,
            pan: if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 },
        })
    }

    /// Channel panned hard left
    pub fn left(frequency_hz: f64) -> Result<Self> {
        Self::new(frequency_hz, LEFT_PAN)
    }

    /// Channel panned hard right
    pub fn right(frequency_hz: f64) -> Result<Self> {
        Self::new(frequency_hz, RIGHT_PAN)
    }

    /// Channel for the given side
    pub fn for_side(side: Side, frequency_hz: f64) -> Result<Self> {
        match side {
            Side::Left => Self::left(frequency_hz),
            Side::Right => Self::right(frequency_hz),
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Same pan, new frequency
    pub fn with_frequency(&self, frequency_hz: f64) -> Result<Self> {
        Self::new(frequency_hz, self.pan)
    }
}

/// Derived beat information for a left/right pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatDescriptor {
    pub left_hz: f64,
    pub right_hz: f64,
}

impl BeatDescriptor {
    pub fn new(left_hz: f64, right_hz: f64) -> Self {
        Self { left_hz, right_hz }
    }

    pub fn from_channels(left: &ToneChannel, right: &ToneChannel) -> Self {
        Self::new(left.frequency_hz(), right.frequency_hz())
    }

    /// Perceived beat: |left - right|
    pub fn beat_hz(&self) -> f64 {
        (self.left_hz - self.right_hz).abs()
    }
}

impl fmt::Display for BeatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L {} Hz · R {} Hz · beat {} Hz",
            self.left_hz,
            self.right_hz,
            self.beat_hz()
        )
    }
}

/// Automatable parameter of the tone graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTarget {
    Frequency(Side),
    MasterGain,
}

/// A value change scheduled on the transport clock (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    /// Jump to `value` at `time`
    SetValueAtTime { value: f32, time: f64 },
    /// Linear glide from the previous event to `value`, arriving at `end_time`
    LinearRampToValueAtTime { value: f32, end_time: f64 },
    /// Exponential glide from the previous event to `value`, arriving at `end_time`
    ExponentialRampToValueAtTime { value: f32, end_time: f64 },
    /// Drop everything scheduled from `time` on and hold the value reached there
    CancelAndHoldAtTime { time: f64 },
}

/// Parameter change addressed to one target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledChange {
    pub target: ParamTarget,
    pub change: ParamChange,
}

impl ScheduledChange {
    pub fn new(target: ParamTarget, change: ParamChange) -> Self {
        Self { target, change }
    }
}

/// Initial values for a freshly opened tone graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphSpec {
    pub left: ToneChannel,
    pub right: ToneChannel,
    pub gain: f32,
}

/// Where a background clip comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackLocator {
    Url(String),
    File(PathBuf),
}

impl TrackLocator {
    /// Interpret `http(s)://` strings as URLs and anything else as a file path
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            TrackLocator::Url(s.to_string())
        } else {
            TrackLocator::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for TrackLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackLocator::Url(url) => write!(f, "{url}"),
            TrackLocator::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Commands sent to the audio engine thread
#[derive(Debug)]
pub enum AudioCommand {
    /// Build the oscillator graph and start generating
    OpenGraph {
        spec: GraphSpec,
        reply: crossbeam_channel::Sender<std::result::Result<(), String>>,
    },
    /// Forward an automation change to the running graph
    Schedule(ScheduledChange),
    /// Tear down the oscillator graph
    CloseGraph,
    /// Start looping an ambient clip
    PlayAmbient {
        locator: TrackLocator,
        volume: f32,
    },
    /// Internal: clip bytes fetched on a worker thread
    AmbientLoaded {
        generation: u64,
        result: std::result::Result<Vec<u8>, String>,
    },
    /// Stop the ambient clip
    StopAmbient,
    /// Shut down the engine thread
    Shutdown,
}

/// Events emitted by the audio engine
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Ambient clip is looping
    AmbientStarted(String),
    /// Ambient clip could not be fetched, decoded or played
    AmbientFailed(String),
    /// The output stream reported an error
    Error(String),
}
