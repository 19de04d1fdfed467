//! Waveform visualization

pub mod canvas;
pub mod visualizer;

pub use canvas::{Canvas, Point, Rgba, SharedTrail, Trace, TrailCanvas};
pub use visualizer::{trace_points, Visualizer, WaveformSource};
