//! Tone synthesis
//!
//! `ToneVoice` renders the two panned sine oscillators through the master
//! gain, sample by sample, evaluating the automation timelines on its own
//! transport clock. It has no I/O and is driven either by the output engine
//! or directly in tests.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::config::audio::RENDER_QUANTUM;

use super::param::ParamTimeline;
use super::types::{GraphSpec, ParamChange, ParamTarget, ScheduledChange, Side};

/// Equal-power gains (left, right) for a mono source at `pan`
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let x = ((pan.clamp(-1.0, 1.0) as f64) + 1.0) / 2.0;
    ((x * FRAC_PI_2).cos() as f32, (x * FRAC_PI_2).sin() as f32)
}

#[derive(Debug, Clone)]
struct Oscillator {
    phase: f64,
    frequency: ParamTimeline,
    gain_left: f32,
    gain_right: f32,
}

impl Oscillator {
    fn new(frequency_hz: f64, pan: f32) -> Self {
        let mut frequency = ParamTimeline::new(frequency_hz as f32);
        frequency.set_value_at_time(frequency_hz as f32, 0.0);
        let (gain_left, gain_right) = pan_gains(pan);
        Self {
            phase: 0.0,
            frequency,
            gain_left,
            gain_right,
        }
    }

    /// Current sample, then advance the phase by one sample period.
    ///
    /// Frequency changes only alter the phase increment, so the waveform
    /// stays continuous across them.
    fn next(&mut self, t: f64, sample_period: f64) -> f32 {
        let out = (self.phase * TAU).sin() as f32;
        let hz = self.frequency.value_at(t) as f64;
        self.phase = (self.phase + hz * sample_period).fract();
        out
    }
}

/// Two-oscillator binaural voice with a shared master gain
#[derive(Debug, Clone)]
pub struct ToneVoice {
    sample_rate: u32,
    left: Oscillator,
    right: Oscillator,
    gain: ParamTimeline,
    frame: u64,
}

impl ToneVoice {
    pub fn new(spec: &GraphSpec, sample_rate: u32) -> Self {
        let mut gain = ParamTimeline::new(spec.gain);
        gain.set_value_at_time(spec.gain, 0.0);
        Self {
            sample_rate: sample_rate.max(1),
            left: Oscillator::new(spec.left.frequency_hz(), spec.left.pan()),
            right: Oscillator::new(spec.right.frequency_hz(), spec.right.pan()),
            gain,
            frame: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Transport time of the next frame to be rendered, in seconds
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    /// Route a scheduled change to its parameter
    pub fn apply(&mut self, change: ScheduledChange) {
        let timeline = match change.target {
            ParamTarget::Frequency(Side::Left) => &mut self.left.frequency,
            ParamTarget::Frequency(Side::Right) => &mut self.right.frequency,
            ParamTarget::MasterGain => &mut self.gain,
        };
        timeline.apply(change.change);
    }

    /// Master gain at transport time `t`
    pub fn gain_at(&self, t: f64) -> f32 {
        self.gain.value_at(t)
    }

    /// Frequency of one oscillator at transport time `t`
    pub fn frequency_at(&self, side: Side, t: f64) -> f32 {
        match side {
            Side::Left => self.left.frequency.value_at(t),
            Side::Right => self.right.frequency.value_at(t),
        }
    }

    /// Render one stereo frame
    pub fn next_frame(&mut self) -> [f32; 2] {
        let t = self.current_time();
        let period = 1.0 / self.sample_rate as f64;
        let l = self.left.next(t, period);
        let r = self.right.next(t, period);
        let gain = self.gain.value_at(t);

        self.frame += 1;
        if self.frame % RENDER_QUANTUM as u64 == 0 {
            let now = self.current_time();
            self.left.frequency.prune_before(now);
            self.right.frequency.prune_before(now);
            self.gain.prune_before(now);
        }

        [
            gain * (l * self.left.gain_left + r * self.right.gain_left),
            gain * (l * self.left.gain_right + r * self.right.gain_right),
        ]
    }

    /// Render interleaved stereo samples into `out` (length must be even)
    pub fn render(&mut self, out: &mut [f32]) {
        for frame in out.chunks_exact_mut(2) {
            let [l, r] = self.next_frame();
            frame[0] = l;
            frame[1] = r;
        }
    }
}

/// Set-value change helper used by the mixer
pub(crate) fn set_at(target: ParamTarget, value: f32, time: f64) -> ScheduledChange {
    ScheduledChange::new(target, ParamChange::SetValueAtTime { value, time })
}
