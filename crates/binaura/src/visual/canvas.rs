//! Drawing surface
//!
//! `Canvas` is the minimal 2D surface the visualizer needs. `TrailCanvas`
//! is a retained-mode implementation: it keeps recent polylines and fades
//! them on every translucent fill, which a frontend can then draw however
//! it likes (the terminal player uses ratatui's canvas widget).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::visual::MIN_TRACE_OPACITY;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 8-bit colour with a float alpha, as in CSS `rgba()`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// 2D surface the visualizer renders to
pub trait Canvas: Send {
    /// Current (width, height) in canvas units
    fn size(&self) -> (f64, f64);

    /// Cover the whole surface with `color` (alpha-blended)
    fn fill(&mut self, color: Rgba);

    /// Draw a connected line through `points`
    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Rgba);
}

/// One retained polyline
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub points: Vec<Point>,
    pub width: f32,
    pub color: Rgba,
    /// Remaining visibility in (0, 1]
    pub opacity: f32,
}

/// Retained-mode canvas with a fading trail of past traces
#[derive(Debug, Clone)]
pub struct TrailCanvas {
    width: f64,
    height: f64,
    background: Rgba,
    traces: VecDeque<Trace>,
}

/// Thread-safe handle to a trail canvas shared with a frontend
pub type SharedTrail = Arc<Mutex<TrailCanvas>>;

impl TrailCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: Rgba::opaque(0, 0, 0),
            traces: VecDeque::new(),
        }
    }

    /// Wrap in a shared handle
    pub fn shared(width: f64, height: f64) -> SharedTrail {
        Arc::new(Mutex::new(Self::new(width, height)))
    }

    /// Follow the host surface size; existing traces are dropped
    pub fn resize(&mut self, width: f64, height: f64) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.traces.clear();
        }
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    /// Traces from oldest to newest
    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter()
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Newest trace, if any
    pub fn latest(&self) -> Option<&Trace> {
        self.traces.back()
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }
}

impl Canvas for TrailCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Rgba) {
        let keep = 1.0 - color.a.clamp(0.0, 1.0);
        for trace in self.traces.iter_mut() {
            trace.opacity *= keep;
        }
        self.traces.retain(|t| t.opacity >= MIN_TRACE_OPACITY);
        self.background = Rgba::opaque(color.r, color.g, color.b);
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Rgba) {
        if points.len() < 2 {
            return;
        }
        self.traces.push_back(Trace {
            points: points.to_vec(),
            width,
            color,
            opacity: color.a.clamp(0.0, 1.0),
        });
    }
}

impl Canvas for SharedTrail {
    fn size(&self) -> (f64, f64) {
        self.lock().unwrap_or_else(|e| e.into_inner()).size()
    }

    fn fill(&mut self, color: Rgba) {
        self.lock().unwrap_or_else(|e| e.into_inner()).fill(color);
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Rgba) {
        self.lock()
            .unwrap_or_else(|e| e.into_inner())
            .stroke_polyline(points, width, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)]
    }

    #[test]
    fn stroke_adds_trace() {
        let mut canvas = TrailCanvas::new(100.0, 50.0);
        canvas.stroke_polyline(&line(), 4.0, Rgba::opaque(1, 2, 3));
        assert_eq!(canvas.trace_count(), 1);
        let trace = canvas.latest().unwrap();
        assert_eq!(trace.opacity, 1.0);
        assert_eq!(trace.width, 4.0);
    }

    #[test]
    fn degenerate_polyline_is_ignored() {
        let mut canvas = TrailCanvas::new(100.0, 50.0);
        canvas.stroke_polyline(&[Point::new(1.0, 1.0)], 4.0, Rgba::opaque(1, 2, 3));
        assert_eq!(canvas.trace_count(), 0);
    }

    #[test]
    fn translucent_fill_fades_existing_traces() {
        let mut canvas = TrailCanvas::new(100.0, 50.0);
        canvas.stroke_polyline(&line(), 4.0, Rgba::opaque(1, 2, 3));
        canvas.fill(Rgba::new(15, 23, 42, 0.8));
        let opacity = canvas.latest().unwrap().opacity;
        assert!((opacity - 0.2).abs() < 1e-6);
        assert_eq!(canvas.background(), Rgba::opaque(15, 23, 42));
    }

    #[test]
    fn faded_traces_are_dropped() {
        let mut canvas = TrailCanvas::new(100.0, 50.0);
        canvas.stroke_polyline(&line(), 4.0, Rgba::opaque(1, 2, 3));
        // 0.2^3 = 0.008 falls below the visibility floor
        for _ in 0..3 {
            canvas.fill(Rgba::new(0, 0, 0, 0.8));
        }
        assert_eq!(canvas.trace_count(), 0);
    }

    #[test]
    fn opaque_fill_clears_trail() {
        let mut canvas = TrailCanvas::new(100.0, 50.0);
        canvas.stroke_polyline(&line(), 4.0, Rgba::opaque(1, 2, 3));
        canvas.fill(Rgba::opaque(0, 0, 0));
        assert_eq!(canvas.trace_count(), 0);
    }

    #[test]
    fn resize_drops_traces_only_on_change() {
        let mut canvas = TrailCanvas::new(100.0, 50.0);
        canvas.stroke_polyline(&line(), 4.0, Rgba::opaque(1, 2, 3));
        canvas.resize(100.0, 50.0);
        assert_eq!(canvas.trace_count(), 1);
        canvas.resize(120.0, 40.0);
        assert_eq!(canvas.trace_count(), 0);
        assert_eq!(canvas.size(), (120.0, 40.0));
    }

    #[test]
    fn shared_trail_forwards_calls() {
        let shared = TrailCanvas::shared(80.0, 20.0);
        let mut handle = shared.clone();
        handle.stroke_polyline(&line(), 2.0, Rgba::opaque(9, 9, 9));
        assert_eq!(handle.size(), (80.0, 20.0));
        assert_eq!(shared.lock().unwrap().trace_count(), 1);
    }
}
