//! Audio output capabilities
//!
//! The controller never touches an audio device directly. It talks to an
//! `AudioBackend` (oscillator graph + analyser) and an `AmbientOutput`
//! (looping background clip). `AudioEngine` implements both on top of rodio;
//! tests inject in-memory fakes.

use crate::error::Result;

use super::types::{GraphSpec, ScheduledChange, TrackLocator};

/// Oscillator graph host
pub trait AudioBackend: Send {
    /// Transport clock of the open graph, in seconds
    fn current_time(&self) -> f64;

    /// Build the two-oscillator graph and start generating.
    ///
    /// Fails with `BeatError::AudioUnavailable` when the host cannot provide
    /// an output graph; nothing is left allocated in that case.
    fn open_graph(&mut self, spec: GraphSpec) -> Result<()>;

    /// Queue an automation change on the open graph
    fn schedule(&mut self, change: ScheduledChange);

    /// Stop the oscillators and release the graph
    fn close_graph(&mut self);

    /// Copy the analyser's 8-bit time-domain data into `out`.
    ///
    /// Returns false when no graph is open.
    fn read_waveform(&self, out: &mut [u8]) -> bool;
}

/// Background clip output
pub trait AmbientOutput: Send {
    /// Start looping the clip at a fixed volume, replacing any current clip
    fn play_looped(&mut self, locator: &TrackLocator, volume: f32) -> Result<()>;

    /// Stop the clip, if any
    fn stop(&mut self);
}
