//! Tone mixer
//!
//! Owns the configured left/right tone pair and master volume, and drives
//! an `AudioBackend` graph with them. While the graph is running, every
//! change is sent as a scheduled value change relative to the backend's
//! transport clock instead of an abrupt write.

use std::fmt;

use crate::config::audio::VOLUME_GLIDE_SECS;
use crate::config::fade::FLOOR_GAIN;
use crate::error::Result;

use super::graph::AudioBackend;
use super::synth::set_at;
use super::types::{
    BeatDescriptor, GraphSpec, ParamChange, ParamTarget, ScheduledChange, Side, ToneChannel,
};

/// Clamp a requested volume into [0, 1]; NaN counts as silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Lifecycle of the oscillator graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixerState {
    #[default]
    Idle,
    Running,
    Fading,
}

impl fmt::Display for MixerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixerState::Idle => write!(f, "Idle"),
            MixerState::Running => write!(f, "Running"),
            MixerState::Fading => write!(f, "Fading"),
        }
    }
}

/// Two panned sine oscillators behind a shared master gain
pub struct ToneMixer {
    backend: Box<dyn AudioBackend>,
    left: ToneChannel,
    right: ToneChannel,
    volume: f32,
    state: MixerState,
}

impl ToneMixer {
    /// Create an idle mixer with a validated initial configuration
    pub fn new(
        backend: Box<dyn AudioBackend>,
        left_hz: f64,
        right_hz: f64,
        volume: f32,
    ) -> Result<Self> {
        Ok(Self {
            backend,
            left: ToneChannel::left(left_hz)?,
            right: ToneChannel::right(right_hz)?,
            volume: clamp_volume(volume),
            state: MixerState::Idle,
        })
    }

    /// Set both frequencies and the master volume.
    ///
    /// Both frequencies are validated before anything is applied.
    pub fn configure(&mut self, left_hz: f64, right_hz: f64, volume: f32) -> Result<BeatDescriptor> {
        let beat = self.set_frequencies(left_hz, right_hz)?;
        self.set_volume(volume);
        Ok(beat)
    }

    /// Set both frequencies; an invalid value leaves both unchanged
    pub fn set_frequencies(&mut self, left_hz: f64, right_hz: f64) -> Result<BeatDescriptor> {
        let left = self.left.with_frequency(left_hz)?;
        let right = self.right.with_frequency(right_hz)?;
        self.left = left;
        self.right = right;
        if self.state == MixerState::Running {
            let now = self.backend.current_time();
            self.backend
                .schedule(set_at(ParamTarget::Frequency(Side::Left), left_hz as f32, now));
            self.backend
                .schedule(set_at(ParamTarget::Frequency(Side::Right), right_hz as f32, now));
        }
        Ok(self.beat())
    }

    /// Set one side's frequency
    pub fn set_frequency(&mut self, side: Side, hz: f64) -> Result<BeatDescriptor> {
        match side {
            Side::Left => self.set_frequencies(hz, self.right.frequency_hz()),
            Side::Right => self.set_frequencies(self.left.frequency_hz(), hz),
        }
    }

    /// Set the master volume (clamped). Returns the applied value.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = clamp_volume(volume);
        if self.state == MixerState::Running {
            let now = self.backend.current_time();
            self.backend.schedule(ScheduledChange::new(
                ParamTarget::MasterGain,
                ParamChange::CancelAndHoldAtTime { time: now },
            ));
            self.backend.schedule(ScheduledChange::new(
                ParamTarget::MasterGain,
                ParamChange::LinearRampToValueAtTime {
                    value: self.volume,
                    end_time: now + VOLUME_GLIDE_SECS,
                },
            ));
        }
        self.volume
    }

    /// Open the graph and start both oscillators.
    ///
    /// Returns `Ok(false)` when the graph is already allocated.
    pub fn start(&mut self) -> Result<bool> {
        if self.state != MixerState::Idle {
            return Ok(false);
        }
        self.backend.open_graph(GraphSpec {
            left: self.left,
            right: self.right,
            gain: self.volume,
        })?;
        self.state = MixerState::Running;
        log::debug!("Tone graph started: {}", self.beat());
        Ok(true)
    }

    /// Begin an exponential fade to the silence floor over `fade_secs`.
    ///
    /// The graph stays allocated until `release()`. Returns false when the
    /// mixer was not running.
    pub fn stop(&mut self, fade_secs: f64) -> bool {
        if self.state != MixerState::Running {
            return false;
        }
        let now = self.backend.current_time();
        self.backend.schedule(ScheduledChange::new(
            ParamTarget::MasterGain,
            ParamChange::CancelAndHoldAtTime { time: now },
        ));
        self.backend.schedule(ScheduledChange::new(
            ParamTarget::MasterGain,
            ParamChange::ExponentialRampToValueAtTime {
                value: FLOOR_GAIN,
                end_time: now + fade_secs.max(0.0),
            },
        ));
        self.state = MixerState::Fading;
        true
    }

    /// Tear down the oscillator graph. Returns false when nothing was allocated.
    pub fn release(&mut self) -> bool {
        if self.state == MixerState::Idle {
            return false;
        }
        self.backend.close_graph();
        self.state = MixerState::Idle;
        log::debug!("Tone graph released");
        true
    }

    pub fn state(&self) -> MixerState {
        self.state
    }

    /// True while a graph is allocated (running or fading)
    pub fn is_active(&self) -> bool {
        self.state != MixerState::Idle
    }

    /// Number of live oscillators: two while a graph exists, otherwise none
    pub fn live_channels(&self) -> usize {
        if self.is_active() {
            2
        } else {
            0
        }
    }

    pub fn left(&self) -> ToneChannel {
        self.left
    }

    pub fn right(&self) -> ToneChannel {
        self.right
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn beat(&self) -> BeatDescriptor {
        BeatDescriptor::from_channels(&self.left, &self.right)
    }

    /// Read the analyser window of the open graph
    pub fn read_waveform(&self, out: &mut [u8]) -> bool {
        self.is_active() && self.backend.read_waveform(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BeatError;
    use crate::testing::FakeBackend;

    fn mixer(backend: &FakeBackend) -> ToneMixer {
        ToneMixer::new(Box::new(backend.clone()), 200.0, 196.0, 0.5).unwrap()
    }

    #[test]
    fn new_rejects_invalid_frequency() {
        let backend = FakeBackend::default();
        assert!(ToneMixer::new(Box::new(backend), 0.0, 196.0, 0.5).is_err());
    }

    #[test]
    fn configure_reports_beat() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        let beat = m.configure(440.0, 450.0, 0.8).unwrap();
        assert_eq!(beat.beat_hz(), 10.0);
        assert_eq!(m.volume(), 0.8);
        assert_eq!(m.left().frequency_hz(), 440.0);
        assert_eq!(m.right().frequency_hz(), 450.0);
    }

    #[test]
    fn configure_clamps_volume() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.configure(100.0, 104.0, 1.7).unwrap();
        assert_eq!(m.volume(), 1.0);
        m.configure(100.0, 104.0, -0.3).unwrap();
        assert_eq!(m.volume(), 0.0);
        assert_eq!(m.set_volume(f32::NAN), 0.0);
    }

    #[test]
    fn invalid_frequency_changes_nothing() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.start().unwrap();
        let err = m.configure(-5.0, 300.0, 0.9).unwrap_err();
        assert!(matches!(err, BeatError::InvalidFrequency(_)));
        assert_eq!(m.left().frequency_hz(), 200.0);
        assert_eq!(m.right().frequency_hz(), 196.0);
        assert_eq!(m.volume(), 0.5);
        assert!(backend.log().changes.is_empty());

        assert!(m.set_frequencies(300.0, f64::NAN).is_err());
        assert_eq!(m.left().frequency_hz(), 200.0);
    }

    #[test]
    fn start_opens_hard_panned_graph() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        assert!(m.start().unwrap());
        assert_eq!(m.state(), MixerState::Running);
        assert_eq!(m.live_channels(), 2);

        let log = backend.log();
        assert_eq!(log.opened.len(), 1);
        let spec = log.opened[0];
        assert_eq!(spec.left.pan(), -1.0);
        assert_eq!(spec.right.pan(), 1.0);
        assert_eq!(spec.left.frequency_hz(), 200.0);
        assert_eq!(spec.right.frequency_hz(), 196.0);
        assert_eq!(spec.gain, 0.5);
    }

    #[test]
    fn start_twice_is_noop() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        assert!(m.start().unwrap());
        assert!(!m.start().unwrap());
        assert_eq!(backend.log().opened.len(), 1);
        assert_eq!(backend.log().open_graphs, 1);
    }

    #[test]
    fn start_failure_stays_idle() {
        let backend = FakeBackend::failing();
        let mut m = mixer(&backend);
        let err = m.start().unwrap_err();
        assert!(matches!(err, BeatError::AudioUnavailable(_)));
        assert_eq!(m.state(), MixerState::Idle);
        assert_eq!(m.live_channels(), 0);
    }

    #[test]
    fn running_frequency_change_is_scheduled_at_now() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.start().unwrap();
        backend.set_time(3.25);
        m.set_frequency(Side::Left, 210.0).unwrap();

        let log = backend.log();
        assert_eq!(
            log.changes,
            vec![
                set_at(ParamTarget::Frequency(Side::Left), 210.0, 3.25),
                set_at(ParamTarget::Frequency(Side::Right), 196.0, 3.25),
            ]
        );
    }

    #[test]
    fn running_volume_change_glides() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.start().unwrap();
        backend.set_time(2.0);
        m.set_volume(0.9);

        let log = backend.log();
        assert_eq!(log.changes.len(), 2);
        assert_eq!(
            log.changes[0].change,
            ParamChange::CancelAndHoldAtTime { time: 2.0 }
        );
        match log.changes[1].change {
            ParamChange::LinearRampToValueAtTime { value, end_time } => {
                assert_eq!(value, 0.9);
                assert!(end_time > 2.0);
            }
            other => panic!("expected linear ramp, got {:?}", other),
        }
    }

    #[test]
    fn idle_changes_are_not_scheduled() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.configure(300.0, 310.0, 0.2).unwrap();
        assert!(backend.log().changes.is_empty());

        m.start().unwrap();
        assert_eq!(backend.log().opened[0].left.frequency_hz(), 300.0);
        assert_eq!(backend.log().opened[0].gain, 0.2);
    }

    #[test]
    fn stop_schedules_exponential_fade() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.start().unwrap();
        backend.set_time(10.0);
        assert!(m.stop(1.5));
        assert_eq!(m.state(), MixerState::Fading);
        assert_eq!(m.live_channels(), 2);

        let log = backend.log();
        assert_eq!(
            log.changes,
            vec![
                ScheduledChange::new(
                    ParamTarget::MasterGain,
                    ParamChange::CancelAndHoldAtTime { time: 10.0 }
                ),
                ScheduledChange::new(
                    ParamTarget::MasterGain,
                    ParamChange::ExponentialRampToValueAtTime {
                        value: FLOOR_GAIN,
                        end_time: 11.5
                    }
                ),
            ]
        );
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        assert!(!m.stop(1.5));
        assert!(!m.release());
        let log = backend.log();
        assert!(log.changes.is_empty());
        assert_eq!(log.closed, 0);
    }

    #[test]
    fn changes_during_fade_do_not_reach_graph() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.start().unwrap();
        m.stop(1.5);
        let scheduled = backend.log().changes.len();

        m.set_volume(1.0);
        m.set_frequencies(500.0, 505.0).unwrap();
        assert!(!m.stop(1.5));
        assert_eq!(backend.log().changes.len(), scheduled);
        assert_eq!(m.beat().beat_hz(), 5.0);
    }

    #[test]
    fn release_closes_graph() {
        let backend = FakeBackend::default();
        let mut m = mixer(&backend);
        m.start().unwrap();
        m.stop(1.5);
        assert!(m.release());
        assert_eq!(m.state(), MixerState::Idle);
        assert_eq!(m.live_channels(), 0);
        assert_eq!(backend.log().closed, 1);
        assert_eq!(backend.log().open_graphs, 0);

        // a fresh start after release opens a new graph
        assert!(m.start().unwrap());
        assert_eq!(backend.log().opened.len(), 2);
    }

    #[test]
    fn waveform_only_readable_while_active() {
        let backend = FakeBackend::default();
        backend.set_waveform(vec![128, 200, 50]);
        let mut m = mixer(&backend);
        let mut out = [0u8; 3];
        assert!(!m.read_waveform(&mut out));
        m.start().unwrap();
        assert!(m.read_waveform(&mut out));
        assert_eq!(out, [128, 200, 50]);
    }
}
