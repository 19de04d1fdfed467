//! Waveform analyser
//!
//! Keeps the most recent window of the mixed (post-gain) output and hands it
//! out as unsigned 8-bit time-domain data, where 128 is the zero crossing.

use std::sync::{Arc, Mutex};

use crate::config::audio::ANALYSER_FFT_SIZE;

/// Convert a float sample in [-1, 1] to the 8-bit analyser encoding
pub fn sample_to_byte(sample: f32) -> u8 {
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}

/// Ring buffer over the most recent `size` mono samples
#[derive(Debug, Clone)]
pub struct WaveformTap {
    ring: Vec<f32>,
    write_pos: usize,
    filled: bool,
}

/// Thread-safe handle to a waveform tap
pub type SharedWaveform = Arc<Mutex<WaveformTap>>;

/// Create a shared tap with the default analyser window
pub fn new_shared_waveform() -> SharedWaveform {
    Arc::new(Mutex::new(WaveformTap::default()))
}

impl Default for WaveformTap {
    fn default() -> Self {
        Self::new(ANALYSER_FFT_SIZE)
    }
}

impl WaveformTap {
    pub fn new(size: usize) -> Self {
        Self {
            ring: vec![0.0; size.max(1)],
            write_pos: 0,
            filled: false,
        }
    }

    /// Window size in samples
    pub fn size(&self) -> usize {
        self.ring.len()
    }

    /// Append one stereo frame, down-mixed to mono
    pub fn push_frame(&mut self, left: f32, right: f32) {
        self.push(0.5 * (left + right));
    }

    /// Append one mono sample
    pub fn push(&mut self, sample: f32) {
        self.ring[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.ring.len() {
            self.write_pos = 0;
            self.filled = true;
        }
    }

    /// Append interleaved stereo samples
    pub fn push_interleaved(&mut self, samples: &[f32]) {
        for frame in samples.chunks_exact(2) {
            self.push_frame(frame[0], frame[1]);
        }
    }

    /// Fill `out` with the oldest `out.len()` samples of the current window.
    ///
    /// Before the window has filled up, unwritten slots read as silence (128).
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let size = self.ring.len();
        // chronological start of the window
        let start = if self.filled { self.write_pos } else { 0 };
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = if i < size {
                sample_to_byte(self.ring[(start + i) % size])
            } else {
                128
            };
        }
    }

    /// Forget all captured audio
    pub fn reset(&mut self) {
        self.ring.iter_mut().for_each(|s| *s = 0.0);
        self.write_pos = 0;
        self.filled = false;
    }
}
