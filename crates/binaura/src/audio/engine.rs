//! Audio engine
//!
//! Runs audio output on a dedicated thread, accepting commands via crossbeam
//! channels and emitting events back. The tone graph is a `ToneSource`
//! appended to its own rodio sink; ambient clips play on a second sink.
//! Waveform data is shared via `Arc<Mutex<WaveformTap>>`.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::config::audio::{DEFAULT_SAMPLE_RATE, RENDER_QUANTUM};
use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::{BeatError, Result};

use super::analyser::{new_shared_waveform, SharedWaveform};
use super::graph::{AmbientOutput, AudioBackend};
use super::synth::ToneVoice;
use super::types::{AudioCommand, AudioEvent, GraphSpec, ScheduledChange, TrackLocator};

/// How long `open_graph` waits for the engine thread to confirm
const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport position of the open tone graph
#[derive(Debug, Default)]
struct Transport {
    frames: AtomicU64,
    sample_rate: AtomicU32,
    open: AtomicBool,
}

impl Transport {
    fn seconds(&self) -> f64 {
        let rate = self.sample_rate.load(Ordering::Acquire).max(1);
        self.frames.load(Ordering::Acquire) as f64 / rate as f64
    }

    fn reset(&self, sample_rate: u32) {
        self.frames.store(0, Ordering::Release);
        self.sample_rate.store(sample_rate, Ordering::Release);
    }
}

/// rodio source rendering a `ToneVoice` one render quantum at a time.
///
/// Automation commands are drained at the start of each quantum; after each
/// quantum the transport clock advances and the block is pushed to the
/// waveform tap.
pub struct ToneSource {
    voice: ToneVoice,
    automation: Receiver<ScheduledChange>,
    transport: Arc<Transport>,
    waveform: SharedWaveform,
    block: Vec<f32>,
    pos: usize,
}

impl ToneSource {
    fn new(
        voice: ToneVoice,
        automation: Receiver<ScheduledChange>,
        transport: Arc<Transport>,
        waveform: SharedWaveform,
    ) -> Self {
        Self {
            voice,
            automation,
            transport,
            waveform,
            block: vec![0.0; RENDER_QUANTUM * 2],
            pos: RENDER_QUANTUM * 2,
        }
    }

    fn render_quantum(&mut self) {
        for change in self.automation.try_iter() {
            self.voice.apply(change);
        }
        self.voice.render(&mut self.block);
        self.transport
            .frames
            .store(self.voice.frames_rendered(), Ordering::Release);
        if let Ok(mut tap) = self.waveform.lock() {
            tap.push_interleaved(&self.block);
        }
        self.pos = 0;
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.block.len() {
            self.render_quantum();
        }
        let sample = self.block[self.pos];
        self.pos += 1;
        Some(sample)
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.voice.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Fetch the bytes of an ambient clip
fn fetch_clip(locator: &TrackLocator) -> Result<Vec<u8>> {
    match locator {
        TrackLocator::File(path) => Ok(std::fs::read(path)?),
        TrackLocator::Url(url) => {
            let client = reqwest::blocking::Client::builder()
                .user_agent(USER_AGENT)
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
                .build()?;
            let response = client.get(url).send()?.error_for_status()?;
            Ok(response.bytes()?.to_vec())
        }
    }
}

/// Cloneable command handle implementing the output capabilities
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: Sender<AudioCommand>,
    transport: Arc<Transport>,
    waveform: SharedWaveform,
}

impl EngineHandle {
    fn send(&self, cmd: AudioCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }
}

impl AudioBackend for EngineHandle {
    fn current_time(&self) -> f64 {
        self.transport.seconds()
    }

    fn open_graph(&mut self, spec: GraphSpec) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        if !self.send(AudioCommand::OpenGraph {
            spec,
            reply: reply_tx,
        }) {
            return Err(BeatError::AudioUnavailable("audio engine stopped".into()));
        }
        match reply_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BeatError::AudioUnavailable(e)),
            Err(_) => Err(BeatError::AudioUnavailable(
                "audio engine did not respond".into(),
            )),
        }
    }

    fn schedule(&mut self, change: ScheduledChange) {
        self.send(AudioCommand::Schedule(change));
    }

    fn close_graph(&mut self) {
        self.transport.open.store(false, Ordering::Release);
        self.send(AudioCommand::CloseGraph);
    }

    fn read_waveform(&self, out: &mut [u8]) -> bool {
        if !self.transport.open.load(Ordering::Acquire) {
            return false;
        }
        match self.waveform.lock() {
            Ok(tap) => {
                tap.byte_time_domain_data(out);
                true
            }
            Err(_) => false,
        }
    }
}

impl AmbientOutput for EngineHandle {
    fn play_looped(&mut self, locator: &TrackLocator, volume: f32) -> Result<()> {
        if self.send(AudioCommand::PlayAmbient {
            locator: locator.clone(),
            volume,
        }) {
            Ok(())
        } else {
            Err(BeatError::BackgroundUnavailable("audio engine stopped".into()))
        }
    }

    fn stop(&mut self) {
        self.send(AudioCommand::StopAmbient);
    }
}

/// Sinks and bookkeeping owned by the engine thread
struct EngineState {
    handle: OutputStreamHandle,
    tone: Option<(Sink, Sender<ScheduledChange>)>,
    ambient: Option<Sink>,
    ambient_generation: u64,
    ambient_pending: Option<(String, f32)>,
}

/// Audio engine that manages output on a dedicated thread
pub struct AudioEngine {
    handle: EngineHandle,
    event_rx: Receiver<AudioEvent>,
    thread: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Create a new audio engine, spawning the engine thread.
    ///
    /// Blocks until the audio output stream is initialized (or fails).
    pub fn new() -> Result<Self> {
        let (cmd_tx, cmd_rx) = bounded::<AudioCommand>(64);
        let (event_tx, event_rx) = bounded::<AudioEvent>(64);
        let (init_tx, init_rx) = bounded::<std::result::Result<(), String>>(1);

        let transport = Arc::new(Transport::default());
        let waveform = new_shared_waveform();

        let thread_cmd_tx = cmd_tx.clone();
        let thread_transport = transport.clone();
        let thread_waveform = waveform.clone();

        let thread = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                Self::run(
                    cmd_rx,
                    thread_cmd_tx,
                    event_tx,
                    init_tx,
                    thread_transport,
                    thread_waveform,
                );
            })
            .map_err(|e| BeatError::AudioUnavailable(format!("Failed to spawn audio thread: {}", e)))?;

        // Wait for initialization
        let init_result = init_rx.recv().map_err(|_| {
            BeatError::AudioUnavailable("Audio thread terminated during init".to_string())
        })?;
        init_result.map_err(BeatError::AudioUnavailable)?;

        Ok(Self {
            handle: EngineHandle {
                cmd_tx,
                transport,
                waveform,
            },
            event_rx,
            thread: Some(thread),
        })
    }

    /// Command handle for the mixer and the background player
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Non-blocking poll for the next event
    pub fn try_recv_event(&self) -> Option<AudioEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a reference to the event receiver for use with `select!`
    pub fn event_receiver(&self) -> &Receiver<AudioEvent> {
        &self.event_rx
    }

    /// Get a handle to the shared waveform tap
    pub fn waveform(&self) -> SharedWaveform {
        self.handle.waveform.clone()
    }

    /// Graceful shutdown (consumes self)
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.handle.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// The engine's main loop, running on the dedicated thread
    fn run(
        cmd_rx: Receiver<AudioCommand>,
        cmd_tx: Sender<AudioCommand>,
        event_tx: Sender<AudioEvent>,
        init_tx: Sender<std::result::Result<(), String>>,
        transport: Arc<Transport>,
        waveform: SharedWaveform,
    ) {
        // Create audio output on this thread (cpal streams may be !Send)
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(format!("Failed to open audio output: {}", e)));
                return;
            }
        };

        let _ = init_tx.send(Ok(()));

        let mut state = EngineState {
            handle,
            tone: None,
            ambient: None,
            ambient_generation: 0,
            ambient_pending: None,
        };

        let emit = |event: AudioEvent| {
            let _ = event_tx.try_send(event);
        };

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::OpenGraph { spec, reply } => {
                    let result = Self::open_tone(&mut state, spec, &transport, &waveform);
                    if let Err(ref e) = result {
                        emit(AudioEvent::Error(e.clone()));
                    }
                    let _ = reply.send(result);
                }
                AudioCommand::Schedule(change) => {
                    if let Some((_, automation)) = &state.tone {
                        let _ = automation.send(change);
                    }
                }
                AudioCommand::CloseGraph => {
                    if let Some((sink, _)) = state.tone.take() {
                        sink.stop();
                        log::debug!("Tone sink stopped");
                    }
                    transport.open.store(false, Ordering::Release);
                    if let Ok(mut tap) = waveform.lock() {
                        tap.reset();
                    }
                }
                AudioCommand::PlayAmbient { locator, volume } => {
                    Self::stop_ambient(&mut state);
                    let generation = state.ambient_generation;
                    state.ambient_pending = Some((locator.to_string(), volume));

                    let tx = cmd_tx.clone();
                    let spawned = thread::Builder::new()
                        .name("ambient-fetch".to_string())
                        .spawn(move || {
                            let result = fetch_clip(&locator).map_err(|e| e.to_string());
                            let _ = tx.send(AudioCommand::AmbientLoaded { generation, result });
                        });
                    if let Err(e) = spawned {
                        state.ambient_pending = None;
                        emit(AudioEvent::AmbientFailed(format!(
                            "Failed to spawn fetch thread: {}",
                            e
                        )));
                    }
                }
                AudioCommand::AmbientLoaded { generation, result } => {
                    if generation != state.ambient_generation {
                        log::debug!("Dropping stale ambient clip (generation {})", generation);
                        continue;
                    }
                    let Some((label, volume)) = state.ambient_pending.take() else {
                        continue;
                    };
                    match result.and_then(|bytes| Self::start_ambient(&mut state, bytes, volume)) {
                        Ok(()) => emit(AudioEvent::AmbientStarted(label)),
                        Err(e) => emit(AudioEvent::AmbientFailed(format!("{}: {}", label, e))),
                    }
                }
                AudioCommand::StopAmbient => Self::stop_ambient(&mut state),
                AudioCommand::Shutdown => {
                    if let Some((sink, _)) = state.tone.take() {
                        sink.stop();
                    }
                    Self::stop_ambient(&mut state);
                    break;
                }
            }
        }
        transport.open.store(false, Ordering::Release);
    }

    fn open_tone(
        state: &mut EngineState,
        spec: GraphSpec,
        transport: &Arc<Transport>,
        waveform: &SharedWaveform,
    ) -> std::result::Result<(), String> {
        if state.tone.is_some() {
            return Ok(());
        }
        let sink = Sink::try_new(&state.handle).map_err(|e| format!("Failed to create sink: {}", e))?;

        let (automation_tx, automation_rx) = unbounded();
        transport.reset(DEFAULT_SAMPLE_RATE);
        if let Ok(mut tap) = waveform.lock() {
            tap.reset();
        }
        let source = ToneSource::new(
            ToneVoice::new(&spec, DEFAULT_SAMPLE_RATE),
            automation_rx,
            transport.clone(),
            waveform.clone(),
        );
        sink.append(source);
        sink.play();
        transport.open.store(true, Ordering::Release);
        state.tone = Some((sink, automation_tx));
        log::debug!("Tone sink started at {} Hz", DEFAULT_SAMPLE_RATE);
        Ok(())
    }

    fn start_ambient(
        state: &mut EngineState,
        bytes: Vec<u8>,
        volume: f32,
    ) -> std::result::Result<(), String> {
        let source = Decoder::new_looped(Cursor::new(bytes)).map_err(|e| format!("Decode error: {}", e))?;
        let sink = Sink::try_new(&state.handle).map_err(|e| format!("Failed to create sink: {}", e))?;
        sink.set_volume(volume);
        sink.append(source);
        sink.play();
        state.ambient = Some(sink);
        Ok(())
    }

    /// Stop the clip and invalidate any load still in flight
    fn stop_ambient(state: &mut EngineState) {
        state.ambient_generation += 1;
        state.ambient_pending = None;
        if let Some(sink) = state.ambient.take() {
            sink.stop();
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}
