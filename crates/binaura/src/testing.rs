//! In-memory fakes for the audio and canvas capabilities

use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::graph::{AmbientOutput, AudioBackend};
use crate::audio::types::{GraphSpec, ScheduledChange, TrackLocator};
use crate::error::{BeatError, Result};
use crate::visual::canvas::{Canvas, Point, Rgba};

#[derive(Debug, Default)]
pub struct BackendLog {
    pub opened: Vec<GraphSpec>,
    pub changes: Vec<ScheduledChange>,
    pub closed: usize,
    pub open_graphs: usize,
    pub time: f64,
    pub fail_open: bool,
    pub waveform: Vec<u8>,
}

/// Records every graph call; clones share the same log
#[derive(Clone, Default)]
pub struct FakeBackend {
    log: Arc<Mutex<BackendLog>>,
}

impl FakeBackend {
    pub fn failing() -> Self {
        let backend = Self::default();
        backend.set_failing(true);
        backend
    }

    pub fn log(&self) -> MutexGuard<'_, BackendLog> {
        self.log.lock().unwrap()
    }

    pub fn set_time(&self, time: f64) {
        self.log().time = time;
    }

    pub fn set_failing(&self, fail: bool) {
        self.log().fail_open = fail;
    }

    pub fn set_waveform(&self, data: Vec<u8>) {
        self.log().waveform = data;
    }
}

impl AudioBackend for FakeBackend {
    fn current_time(&self) -> f64 {
        self.log().time
    }

    fn open_graph(&mut self, spec: GraphSpec) -> Result<()> {
        let mut log = self.log();
        if log.fail_open {
            return Err(BeatError::AudioUnavailable("autoplay blocked".into()));
        }
        log.opened.push(spec);
        log.open_graphs += 1;
        Ok(())
    }

    fn schedule(&mut self, change: ScheduledChange) {
        self.log().changes.push(change);
    }

    fn close_graph(&mut self) {
        let mut log = self.log();
        log.closed += 1;
        log.open_graphs = log.open_graphs.saturating_sub(1);
    }

    fn read_waveform(&self, out: &mut [u8]) -> bool {
        let log = self.log();
        if log.open_graphs == 0 {
            return false;
        }
        for (slot, value) in out.iter_mut().zip(log.waveform.iter().chain(std::iter::repeat(&128))) {
            *slot = *value;
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct AmbientLog {
    pub played: Vec<(TrackLocator, f32)>,
    pub stops: usize,
    pub playing: Option<TrackLocator>,
    pub fail: bool,
}

/// Records ambient clip calls; clones share the same log
#[derive(Clone, Default)]
pub struct FakeAmbient {
    log: Arc<Mutex<AmbientLog>>,
}

impl FakeAmbient {
    pub fn log(&self) -> MutexGuard<'_, AmbientLog> {
        self.log.lock().unwrap()
    }

    pub fn set_failing(&self, fail: bool) {
        self.log().fail = fail;
    }
}

impl AmbientOutput for FakeAmbient {
    fn play_looped(&mut self, locator: &TrackLocator, volume: f32) -> Result<()> {
        let mut log = self.log();
        if log.fail {
            return Err(BeatError::BackgroundUnavailable("blocked".into()));
        }
        log.played.push((locator.clone(), volume));
        log.playing = Some(locator.clone());
        Ok(())
    }

    fn stop(&mut self) {
        let mut log = self.log();
        log.stops += 1;
        log.playing = None;
    }
}

/// Canvas call recorded by `RecordingCanvas`
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Fill(Rgba),
    Stroke { points: Vec<Point>, width: f32, color: Rgba },
}

/// Canvas that records calls; clones share the same op list
#[derive(Clone)]
pub struct RecordingCanvas {
    pub width: f64,
    pub height: f64,
    ops: Arc<Mutex<Vec<CanvasOp>>>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ops(&self) -> MutexGuard<'_, Vec<CanvasOp>> {
        self.ops.lock().unwrap()
    }

    pub fn frames(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, CanvasOp::Stroke { .. }))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Rgba) {
        self.ops().push(CanvasOp::Fill(color));
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Rgba) {
        self.ops().push(CanvasOp::Stroke {
            points: points.to_vec(),
            width,
            color,
        });
    }
}
