//! Parameter automation
//!
//! `ParamTimeline` evaluates a list of scheduled value changes at any point
//! on the transport clock, with Web Audio `AudioParam` semantics: a ramp runs
//! from the previous event to its own end time, and an exponential ramp
//! between values of different sign (or from zero) holds the start value.

use super::types::ParamChange;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Event {
    kind: Kind,
    value: f32,
    time: f64,
}

/// Automation timeline for a single parameter
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    default_value: f32,
    events: Vec<Event>,
}

impl ParamTimeline {
    /// Timeline that reports `default_value` until the first event
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    /// Apply a scheduled change
    pub fn apply(&mut self, change: ParamChange) {
        match change {
            ParamChange::SetValueAtTime { value, time } => self.insert(Kind::Set, value, time),
            ParamChange::LinearRampToValueAtTime { value, end_time } => {
                self.insert(Kind::Linear, value, end_time)
            }
            ParamChange::ExponentialRampToValueAtTime { value, end_time } => {
                self.insert(Kind::Exponential, value, end_time)
            }
            ParamChange::CancelAndHoldAtTime { time } => self.cancel_and_hold(time),
        }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.apply(ParamChange::SetValueAtTime { value, time });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.apply(ParamChange::LinearRampToValueAtTime { value, end_time });
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.apply(ParamChange::ExponentialRampToValueAtTime { value, end_time });
    }

    pub fn cancel_and_hold_at_time(&mut self, time: f64) {
        self.apply(ParamChange::CancelAndHoldAtTime { time });
    }

    /// Number of pending events (for tests and diagnostics)
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Parameter value at transport time `t`
    pub fn value_at(&self, t: f64) -> f32 {
        // index of the first event strictly after t
        let next = self.events.partition_point(|e| e.time <= t);

        let (prev_value, prev_time) = match next.checked_sub(1) {
            Some(i) => (self.events[i].value, self.events[i].time),
            None => (self.default_value, f64::NEG_INFINITY),
        };

        let Some(upcoming) = self.events.get(next) else {
            return prev_value;
        };

        match upcoming.kind {
            Kind::Set => prev_value,
            Kind::Linear => {
                if !prev_time.is_finite() {
                    return prev_value;
                }
                let span = upcoming.time - prev_time;
                let progress = ((t - prev_time) / span) as f32;
                prev_value + (upcoming.value - prev_value) * progress
            }
            Kind::Exponential => {
                if !prev_time.is_finite()
                    || prev_value == 0.0
                    || upcoming.value == 0.0
                    || prev_value.signum() != upcoming.value.signum()
                {
                    return prev_value;
                }
                let span = upcoming.time - prev_time;
                let progress = (t - prev_time) / span;
                let ratio = (upcoming.value / prev_value) as f64;
                (prev_value as f64 * ratio.powf(progress)) as f32
            }
        }
    }

    /// Forget events that can no longer influence values at or after `t`.
    ///
    /// The last event at or before `t` is kept as the anchor of any ramp
    /// still in progress.
    pub fn prune_before(&mut self, t: f64) {
        let next = self.events.partition_point(|e| e.time <= t);
        if next > 1 {
            self.events.drain(..next - 1);
        }
    }

    fn insert(&mut self, kind: Kind, value: f32, time: f64) {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        // Events with equal time keep insertion order
        let at = self.events.partition_point(|e| e.time <= time);
        self.events.insert(at, Event { kind, value, time });
    }

    fn cancel_and_hold(&mut self, time: f64) {
        let held = self.value_at(time);
        self.events.retain(|e| e.time < time);
        self.insert(Kind::Set, held, time);
    }
}
