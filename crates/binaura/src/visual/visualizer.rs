//! Waveform visualizer
//!
//! Draws the mixed output as a single amplitude trace. Each frame covers the
//! canvas with a translucent fill (leaving a short trail of earlier frames)
//! and strokes a polyline with one x-step per sample.

use crate::audio::mixer::ToneMixer;
use crate::config::audio::WAVEFORM_LEN;
use crate::config::visual::{BACKGROUND, LINE_WIDTH, STROKE};

use super::canvas::{Canvas, Point, Rgba};

/// Readable real-time amplitude samples (8-bit, 128 = zero crossing)
pub trait WaveformSource {
    /// Fill `out`; returns false when no audio graph is available
    fn read_waveform(&self, out: &mut [u8]) -> bool;
}

impl WaveformSource for ToneMixer {
    fn read_waveform(&self, out: &mut [u8]) -> bool {
        ToneMixer::read_waveform(self, out)
    }
}

/// Map samples to canvas coordinates.
///
/// x advances by `width / samples.len()` per sample and y is
/// `(sample / 128) * height / 2`; the trace ends at the right edge's midline.
pub fn trace_points(samples: &[u8], width: f64, height: f64) -> Vec<Point> {
    if samples.is_empty() {
        return Vec::new();
    }
    let slice_width = width / samples.len() as f64;
    let mut points = Vec::with_capacity(samples.len() + 1);
    let mut x = 0.0;
    for &sample in samples {
        let v = sample as f64 / 128.0;
        points.push(Point::new(x, v * height / 2.0));
        x += slice_width;
    }
    points.push(Point::new(width, height / 2.0));
    points
}

/// Renders waveform frames onto a canvas
pub struct Visualizer {
    canvas: Box<dyn Canvas>,
    samples: Vec<u8>,
    frames_rendered: u64,
}

impl Visualizer {
    /// Visualizer reading the default number of samples per frame
    pub fn new(canvas: Box<dyn Canvas>) -> Self {
        Self::with_sample_count(canvas, WAVEFORM_LEN)
    }

    pub fn with_sample_count(canvas: Box<dyn Canvas>, sample_count: usize) -> Self {
        Self {
            canvas,
            samples: vec![128; sample_count.max(1)],
            frames_rendered: 0,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Samples captured by the most recent frame
    pub fn last_samples(&self) -> &[u8] {
        &self.samples
    }

    /// Draw one frame. Returns false (drawing nothing) when the source has no data.
    pub fn render_frame(&mut self, source: &dyn WaveformSource) -> bool {
        if !source.read_waveform(&mut self.samples) {
            return false;
        }

        let (width, height) = self.canvas.size();
        let (r, g, b, a) = BACKGROUND;
        self.canvas.fill(Rgba::new(r, g, b, a));

        let points = trace_points(&self.samples, width, height);
        let (r, g, b) = STROKE;
        self.canvas
            .stroke_polyline(&points, LINE_WIDTH, Rgba::opaque(r, g, b));

        self.frames_rendered += 1;
        true
    }
}
