//! Playback controller
//!
//! Owns the session state machine (Idle → Playing → FadingOut → Idle) and
//! orchestrates the tone mixer, background player, countdown and visualizer.
//!
//! Time only moves through `poll()`: the host calls it whenever
//! `next_wakeup()` elapses (or sooner) and every due scheduler task runs in
//! deadline order with its own due time as "now". A late wakeup therefore
//! replays the missed countdown ticks exactly, while missed display frames
//! collapse into one.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::audio::background::{AmbientTrack, BackgroundTrackPlayer};
use crate::audio::mixer::ToneMixer;
use crate::audio::types::{BeatDescriptor, Side};
use crate::config::timer::MAX_MINUTES;
use crate::error::Result;
use crate::presets::Preset;
use crate::visual::visualizer::Visualizer;

use super::clock::Clock;
use super::scheduler::{Cadence, Scheduler, TaskId};
use super::state::{
    ControllerEvent, FadeConfig, PlaybackSession, PlaybackState, SessionConfig, SessionSnapshot,
};
use super::timer::{SessionTimer, TimerEvent};

const EVENT_QUEUE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    TimerTick,
    Frame,
    Teardown { generation: u64 },
}

/// Orchestrates one binaural-beat session at a time
pub struct PlaybackController {
    mixer: ToneMixer,
    background: BackgroundTrackPlayer,
    timer: SessionTimer,
    visualizer: Visualizer,
    scheduler: Scheduler<Task>,
    clock: Box<dyn Clock>,
    session: PlaybackSession,
    timer_secs: u64,
    fade: FadeConfig,
    tick_period: Duration,
    frame_period: Duration,
    timer_task: Option<TaskId>,
    frame_task: Option<TaskId>,
    teardown_task: Option<TaskId>,
    event_tx: Sender<ControllerEvent>,
    event_rx: Receiver<ControllerEvent>,
}

impl PlaybackController {
    /// Assemble a controller; the mixer is reconfigured from `config`
    pub fn new(
        mut mixer: ToneMixer,
        background: BackgroundTrackPlayer,
        visualizer: Visualizer,
        clock: Box<dyn Clock>,
        config: SessionConfig,
    ) -> Result<Self> {
        mixer.configure(config.left_hz, config.right_hz, config.volume)?;
        let mut session = PlaybackSession::new(&config)?;
        session.volume = mixer.volume();

        let (event_tx, event_rx) = bounded(EVENT_QUEUE_LEN);

        Ok(Self {
            mixer,
            background,
            timer: SessionTimer::new(),
            visualizer,
            scheduler: Scheduler::new(),
            clock,
            session,
            timer_secs: config.timer_secs,
            fade: config.fade,
            tick_period: config.tick_period,
            frame_period: config.frame_period,
            timer_task: None,
            frame_task: None,
            teardown_task: None,
            event_tx,
            event_rx,
        })
    }

    // --- Configuration ---

    /// Set both frequencies and the volume. Invalid frequencies change nothing.
    pub fn configure(&mut self, left_hz: f64, right_hz: f64, volume: f32) -> Result<BeatDescriptor> {
        let beat = self.mixer.configure(left_hz, right_hz, volume)?;
        self.sync_from_mixer();
        Ok(beat)
    }

    pub fn set_frequencies(&mut self, left_hz: f64, right_hz: f64) -> Result<BeatDescriptor> {
        let beat = self.mixer.set_frequencies(left_hz, right_hz)?;
        self.sync_from_mixer();
        Ok(beat)
    }

    pub fn set_frequency(&mut self, side: Side, hz: f64) -> Result<BeatDescriptor> {
        let beat = self.mixer.set_frequency(side, hz)?;
        self.sync_from_mixer();
        Ok(beat)
    }

    /// Returns the clamped volume actually applied
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let applied = self.mixer.set_volume(volume);
        self.session.volume = applied;
        applied
    }

    /// Session length for the next start; zero means no countdown
    pub fn set_timer_secs(&mut self, secs: u64) {
        self.timer_secs = secs;
        if self.session.state == PlaybackState::Idle {
            self.session.remaining_secs = secs;
        }
    }

    /// Timer slider, clamped to the supported range
    pub fn set_timer_minutes(&mut self, minutes: u32) {
        self.set_timer_secs(minutes.min(MAX_MINUTES) as u64 * 60);
    }

    /// Change the ambient selection; while playing the switch is immediate
    pub fn select_background(&mut self, track: Option<AmbientTrack>) {
        self.session.background = track;
        if self.session.state != PlaybackState::Playing {
            return;
        }
        match track {
            Some(track) => {
                self.background.play(track);
            }
            None => self.background.stop(),
        }
    }

    /// Load a preset's pair and end any running session
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<BeatDescriptor> {
        let beat = self.set_frequencies(preset.left_hz, preset.right_hz)?;
        log::info!("Preset {} ({})", preset.name, beat);
        self.stop();
        Ok(beat)
    }

    // --- Lifecycle ---

    /// Idle → Playing. Returns `Ok(false)` when a session is already live.
    ///
    /// If the output graph cannot be opened the controller stays Idle and an
    /// `Error` event is emitted.
    pub fn play(&mut self) -> Result<bool> {
        if self.session.state != PlaybackState::Idle {
            return Ok(false);
        }

        if let Err(e) = self.mixer.start() {
            log::warn!("Cannot start session: {}", e);
            self.emit(ControllerEvent::Error(e.to_string()));
            return Err(e);
        }

        let now = self.clock.now();
        self.session.generation += 1;
        self.session.state = PlaybackState::Playing;
        self.session.started_at = Some(now);

        if let Some(track) = self.session.background {
            self.background.play(track);
        }

        self.session.remaining_secs = self.timer_secs;
        if self.timer.start(self.timer_secs) {
            self.timer_task = Some(self.scheduler.every(
                now + self.tick_period,
                self.tick_period,
                Cadence::Steady,
                Task::TimerTick,
            ));
        }

        self.frame_task = Some(self.scheduler.every(
            now,
            self.frame_period,
            Cadence::Coalesce,
            Task::Frame,
        ));

        log::info!("Session started: {}", self.session.beat());
        self.emit(ControllerEvent::StateChanged(PlaybackState::Playing));
        Ok(true)
    }

    /// Playing → FadingOut. Returns false (doing nothing) in any other state.
    pub fn stop(&mut self) -> bool {
        if self.session.state != PlaybackState::Playing {
            return false;
        }
        let now = self.clock.now();
        self.begin_fade(now);
        true
    }

    /// Tear everything down immediately, without a fade
    pub fn abort(&mut self) -> bool {
        if self.session.state == PlaybackState::Idle {
            return false;
        }
        for task in [
            self.timer_task.take(),
            self.frame_task.take(),
            self.teardown_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(task);
        }
        self.timer.cancel();
        self.finish_session();
        log::info!("Session aborted");
        true
    }

    /// Record an asynchronous background failure reported by the output engine
    pub fn report_background_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Background track failed: {}", message);
        self.emit(ControllerEvent::BackgroundFailed(message));
    }

    // --- Scheduling ---

    /// Run every task that is due. Returns how many ran.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        while let Some((id, due, task)) = self.scheduler.pop_due(now) {
            self.run_task(id, due, task);
            ran += 1;
        }
        ran
    }

    /// Time until the next scheduled task, if any
    pub fn next_wakeup(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.scheduler
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now))
    }

    fn run_task(&mut self, id: TaskId, due: Duration, task: Task) {
        match task {
            Task::TimerTick => self.on_timer_tick(id, due),
            Task::Frame => self.on_frame(id),
            Task::Teardown { generation } => self.on_teardown(generation),
        }
    }

    fn on_timer_tick(&mut self, id: TaskId, due: Duration) {
        match self.timer.tick() {
            Some(TimerEvent::Tick(remaining)) => {
                self.session.remaining_secs = remaining;
                self.emit(ControllerEvent::TimerTick(remaining));
            }
            Some(TimerEvent::Expired) => {
                self.session.remaining_secs = 0;
                log::info!("Session timer expired");
                self.emit(ControllerEvent::TimerTick(0));
                self.emit(ControllerEvent::TimerExpired);
                if self.session.state == PlaybackState::Playing {
                    self.begin_fade(due);
                }
            }
            None => {
                self.scheduler.cancel(id);
                self.timer_task = None;
            }
        }
    }

    fn on_frame(&mut self, id: TaskId) {
        if self.session.state != PlaybackState::Playing {
            self.scheduler.cancel(id);
            self.frame_task = None;
            return;
        }
        self.visualizer.render_frame(&self.mixer);
    }

    fn on_teardown(&mut self, generation: u64) {
        if generation != self.session.generation || self.session.state != PlaybackState::FadingOut {
            log::debug!(
                "Ignoring stale teardown (generation {}, current {})",
                generation,
                self.session.generation
            );
            return;
        }
        self.teardown_task = None;
        self.finish_session();
        log::info!("Session ended");
    }

    /// Playing → FadingOut as of `now`
    fn begin_fade(&mut self, now: Duration) {
        if let Some(task) = self.timer_task.take() {
            self.scheduler.cancel(task);
        }
        self.timer.cancel();
        self.mixer.stop(self.fade.ramp.as_secs_f64());
        self.session.state = PlaybackState::FadingOut;
        self.teardown_task = Some(self.scheduler.once(
            now + self.fade.teardown_delay,
            Task::Teardown {
                generation: self.session.generation,
            },
        ));
        self.emit(ControllerEvent::StateChanged(PlaybackState::FadingOut));
    }

    /// Release every resource and return to Idle
    fn finish_session(&mut self) {
        // a frame re-armed earlier in the same poll must not outlive the session
        for task in [self.timer_task.take(), self.frame_task.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(task);
        }
        self.background.stop();
        self.mixer.release();
        self.session.state = PlaybackState::Idle;
        self.session.started_at = None;
        self.session.generation += 1;
        self.emit(ControllerEvent::StateChanged(PlaybackState::Idle));
    }

    // --- Observation ---

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn beat(&self) -> BeatDescriptor {
        self.session.beat()
    }

    pub fn timer_secs(&self) -> u64 {
        self.timer_secs
    }

    pub fn mixer(&self) -> &ToneMixer {
        &self.mixer
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state,
            left_hz: self.session.left.frequency_hz(),
            right_hz: self.session.right.frequency_hz(),
            beat_hz: self.session.beat().beat_hz(),
            volume: self.session.volume,
            background: self.session.background,
            timer_secs: self.timer_secs,
            remaining_secs: self.session.remaining_secs,
            live_channels: self.mixer.live_channels(),
            started_at: self.session.started_at,
        }
    }

    /// Receiver for use with `select!`
    pub fn events(&self) -> &Receiver<ControllerEvent> {
        &self.event_rx
    }

    /// Non-blocking poll for the next event
    pub fn try_recv_event(&self) -> Option<ControllerEvent> {
        self.event_rx.try_recv().ok()
    }

    fn sync_from_mixer(&mut self) {
        self.session.left = self.mixer.left();
        self.session.right = self.mixer.right();
        self.session.volume = self.mixer.volume();
    }

    fn emit(&self, event: ControllerEvent) {
        if self.event_tx.try_send(event).is_err() {
            log::debug!("Controller event queue full, dropping event");
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if self.session.state != PlaybackState::Idle {
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::background::TrackCatalog;
    use crate::audio::types::{ParamChange, ParamTarget};
    use crate::error::BeatError;
    use crate::presets;
    use crate::session::clock::ManualClock;
    use crate::testing::{FakeAmbient, FakeBackend, RecordingCanvas};

    struct Rig {
        controller: PlaybackController,
        backend: FakeBackend,
        ambient: FakeAmbient,
        canvas: RecordingCanvas,
        clock: ManualClock,
    }

    fn rig_with(backend: FakeBackend, config: SessionConfig) -> Rig {
        let ambient = FakeAmbient::default();
        let canvas = RecordingCanvas::new(400.0, 100.0);
        let clock = ManualClock::new();
        let mixer = ToneMixer::new(Box::new(backend.clone()), 200.0, 196.0, 0.5).unwrap();
        let background = BackgroundTrackPlayer::new(Box::new(ambient.clone()), TrackCatalog::default());
        let visualizer = Visualizer::with_sample_count(Box::new(canvas.clone()), 16);
        let controller =
            PlaybackController::new(mixer, background, visualizer, Box::new(clock.clone()), config)
                .unwrap();
        Rig {
            controller,
            backend,
            ambient,
            canvas,
            clock,
        }
    }

    fn rig(config: SessionConfig) -> Rig {
        rig_with(FakeBackend::default(), config)
    }

    fn timed(left_hz: f64, right_hz: f64, timer_secs: u64) -> SessionConfig {
        SessionConfig {
            left_hz,
            right_hz,
            timer_secs,
            ..SessionConfig::default()
        }
    }

    fn drain(controller: &PlaybackController) -> Vec<ControllerEvent> {
        std::iter::from_fn(|| controller.try_recv_event()).collect()
    }

    fn advance(r: &mut Rig, by: Duration) {
        r.clock.advance(by);
        r.controller.poll();
    }

    #[test]
    fn beat_tracks_every_configure() {
        let mut r = rig(timed(200.0, 196.0, 0));
        assert_eq!(r.controller.beat().beat_hz(), 4.0);

        r.controller.play().unwrap();
        let beat = r.controller.configure(300.0, 310.0, 0.5).unwrap();
        assert_eq!(beat.beat_hz(), 10.0);
        assert_eq!(r.controller.snapshot().beat_hz, 10.0);

        let beat = r.controller.set_frequency(Side::Left, 305.0).unwrap();
        assert_eq!(beat.beat_hz(), 5.0);
    }

    #[test]
    fn frequency_change_while_playing_is_scheduled_at_now() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.play().unwrap();
        r.backend.set_time(2.5);
        r.controller.set_frequencies(210.0, 200.0).unwrap();

        let log = r.backend.log();
        let sets: Vec<_> = log
            .changes
            .iter()
            .filter(|c| matches!(c.target, ParamTarget::Frequency(_)))
            .collect();
        assert_eq!(sets.len(), 2);
        assert_eq!(
            sets[0].change,
            ParamChange::SetValueAtTime {
                value: 210.0,
                time: 2.5
            }
        );
    }

    #[test]
    fn invalid_frequency_leaves_session_unchanged() {
        let mut r = rig(timed(200.0, 196.0, 0));
        let err = r.controller.configure(-1.0, 300.0, 0.9).unwrap_err();
        assert!(matches!(err, BeatError::InvalidFrequency(_)));
        let snap = r.controller.snapshot();
        assert_eq!((snap.left_hz, snap.right_hz, snap.volume), (200.0, 196.0, 0.5));
    }

    #[test]
    fn play_twice_opens_one_graph() {
        let mut r = rig(timed(200.0, 196.0, 0));
        assert!(r.controller.play().unwrap());
        assert!(!r.controller.play().unwrap());
        assert_eq!(r.backend.log().opened.len(), 1);
        assert_eq!(r.backend.log().open_graphs, 1);
    }

    #[test]
    fn stop_from_idle_is_noop() {
        let mut r = rig(timed(200.0, 196.0, 0));
        assert!(!r.controller.stop());
        assert_eq!(r.controller.state(), PlaybackState::Idle);
        assert!(r.backend.log().changes.is_empty());
        assert!(drain(&r.controller).is_empty());
    }

    #[test]
    fn stop_during_fade_is_noop() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.play().unwrap();
        assert!(r.controller.stop());
        let changes = r.backend.log().changes.len();
        assert!(!r.controller.stop());
        assert_eq!(r.backend.log().changes.len(), changes);
        assert!(!r.controller.play().unwrap());
    }

    #[test]
    fn full_lifecycle_releases_oscillators() {
        let mut r = rig(timed(200.0, 196.0, 0));
        assert_eq!(r.controller.beat().beat_hz(), 4.0);

        r.controller.play().unwrap();
        let snap = r.controller.snapshot();
        assert_eq!(snap.state, PlaybackState::Playing);
        assert_eq!(snap.live_channels, 2);

        r.controller.stop();
        assert_eq!(r.controller.state(), PlaybackState::FadingOut);
        assert_eq!(r.controller.snapshot().live_channels, 2);

        // the fade ramps to the floor over 1.5 s
        let fade = r.backend.log().changes.last().copied().unwrap();
        assert_eq!(
            fade.change,
            ParamChange::ExponentialRampToValueAtTime {
                value: 0.01,
                end_time: 1.5
            }
        );

        advance(&mut r, Duration::from_millis(1599));
        assert_eq!(r.controller.state(), PlaybackState::FadingOut);
        advance(&mut r, Duration::from_millis(1));
        assert_eq!(r.controller.state(), PlaybackState::Idle);
        assert_eq!(r.controller.snapshot().live_channels, 0);
        assert_eq!(r.backend.log().open_graphs, 0);

        let states: Vec<_> = drain(&r.controller)
            .into_iter()
            .filter_map(|e| match e {
                ControllerEvent::StateChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                PlaybackState::Playing,
                PlaybackState::FadingOut,
                PlaybackState::Idle
            ]
        );
    }

    #[test]
    fn timer_expiry_fades_then_tears_down() {
        let mut r = rig(timed(200.0, 196.0, 3));
        r.controller.play().unwrap();

        advance(&mut r, Duration::from_secs(2));
        assert_eq!(r.controller.state(), PlaybackState::Playing);
        assert_eq!(r.controller.snapshot().remaining_display(), "00:01");

        advance(&mut r, Duration::from_secs(1));
        assert_eq!(r.controller.state(), PlaybackState::FadingOut);
        assert_eq!(r.controller.snapshot().remaining_secs, 0);

        advance(&mut r, Duration::from_millis(1599));
        assert_eq!(r.controller.state(), PlaybackState::FadingOut);
        advance(&mut r, Duration::from_millis(1));
        assert_eq!(r.controller.state(), PlaybackState::Idle);

        let events = drain(&r.controller);
        let expired = events
            .iter()
            .filter(|e| **e == ControllerEvent::TimerExpired)
            .count();
        assert_eq!(expired, 1);
        assert!(events.contains(&ControllerEvent::TimerTick(2)));
        assert!(events.contains(&ControllerEvent::TimerTick(1)));
    }

    #[test]
    fn late_wakeup_replays_the_whole_schedule() {
        let mut r = rig(timed(200.0, 196.0, 3));
        r.controller.play().unwrap();
        advance(&mut r, Duration::from_secs(10));
        assert_eq!(r.controller.state(), PlaybackState::Idle);
        assert_eq!(r.backend.log().open_graphs, 0);
    }

    #[test]
    fn remaining_time_never_increases_while_playing() {
        let mut r = rig(timed(200.0, 196.0, 5));
        r.controller.play().unwrap();
        let mut last = r.controller.snapshot().remaining_secs;
        for _ in 0..4 {
            r.controller.set_timer_minutes(30);
            advance(&mut r, Duration::from_secs(1));
            let now = r.controller.snapshot().remaining_secs;
            assert!(now <= last);
            last = now;
        }
    }

    #[test]
    fn stale_teardown_does_not_reset_new_session() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.play().unwrap();
        r.controller.stop();
        r.controller.abort();
        assert_eq!(r.controller.state(), PlaybackState::Idle);

        r.controller.play().unwrap();
        advance(&mut r, Duration::from_secs(5));
        assert_eq!(r.controller.state(), PlaybackState::Playing);
        assert_eq!(r.backend.log().open_graphs, 1);
    }

    #[test]
    fn teardown_for_old_generation_is_ignored() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.play().unwrap();
        let old = r.controller.session().generation;
        r.controller.stop();
        r.controller.abort();
        r.controller.play().unwrap();
        r.controller.stop();

        r.controller.on_teardown(old);
        assert_eq!(r.controller.state(), PlaybackState::FadingOut);

        advance(&mut r, Duration::from_millis(1600));
        assert_eq!(r.controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn zero_timer_runs_until_stopped() {
        let mut r = rig(timed(440.0, 450.0, 0));
        assert_eq!(r.controller.beat().beat_hz(), 10.0);
        r.controller.play().unwrap();
        advance(&mut r, Duration::from_secs(3600));
        assert_eq!(r.controller.state(), PlaybackState::Playing);
        assert!(!drain(&r.controller).contains(&ControllerEvent::TimerExpired));

        assert!(r.controller.stop());
        advance(&mut r, Duration::from_secs(2));
        assert_eq!(r.controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn audio_unavailable_leaves_controller_idle() {
        let mut r = rig_with(FakeBackend::failing(), timed(200.0, 196.0, 60));
        r.controller.select_background(Some(AmbientTrack::Rain));
        let err = r.controller.play().unwrap_err();
        assert!(matches!(err, BeatError::AudioUnavailable(_)));
        assert_eq!(r.controller.state(), PlaybackState::Idle);
        assert_eq!(r.controller.next_wakeup(), None);
        assert!(r.ambient.log().played.is_empty());
        assert!(matches!(
            drain(&r.controller).as_slice(),
            [ControllerEvent::Error(_)]
        ));

        r.backend.set_failing(false);
        assert!(r.controller.play().unwrap());
    }

    #[test]
    fn background_follows_session() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.select_background(Some(AmbientTrack::Rain));
        assert!(r.ambient.log().played.is_empty());

        r.controller.play().unwrap();
        assert_eq!(r.ambient.log().played.len(), 1);

        r.controller.select_background(Some(AmbientTrack::Ocean));
        assert_eq!(r.ambient.log().played.len(), 2);

        r.controller.stop();
        assert!(r.ambient.log().playing.is_some());
        advance(&mut r, Duration::from_millis(1600));
        assert!(r.ambient.log().playing.is_none());
    }

    #[test]
    fn background_failure_does_not_abort_playback() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.ambient.set_failing(true);
        r.controller.select_background(Some(AmbientTrack::Forest));
        assert!(r.controller.play().unwrap());
        assert_eq!(r.controller.state(), PlaybackState::Playing);

        r.controller.report_background_failure("decode failed");
        assert!(drain(&r.controller)
            .contains(&ControllerEvent::BackgroundFailed("decode failed".into())));
        assert_eq!(r.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn visualizer_draws_only_while_playing() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.poll();
        assert_eq!(r.canvas.frames(), 0);

        r.controller.play().unwrap();
        r.controller.poll();
        assert_eq!(r.canvas.frames(), 1);

        advance(&mut r, Duration::from_millis(17));
        assert_eq!(r.canvas.frames(), 2);

        r.controller.stop();
        advance(&mut r, Duration::from_millis(17));
        assert_eq!(r.canvas.frames(), 2);
        assert_eq!(r.controller.frame_task, None);
    }

    #[test]
    fn replay_after_caught_up_session_runs_one_render_loop() {
        let mut r = rig(timed(200.0, 196.0, 1));
        r.controller.play().unwrap();
        r.controller.poll();

        // expiry and teardown both land inside one wakeup
        advance(&mut r, Duration::from_secs(5));
        assert_eq!(r.controller.state(), PlaybackState::Idle);
        assert!(r.controller.scheduler.is_empty());
        assert_eq!(r.controller.next_wakeup(), None);

        r.controller.play().unwrap();
        r.controller.poll();
        let before = r.canvas.frames();
        advance(&mut r, Duration::from_millis(17));
        assert_eq!(r.canvas.frames() - before, 1);
    }

    #[test]
    fn preset_stops_running_session() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.play().unwrap();
        let focus = presets::find("Focus").unwrap();
        let beat = r.controller.apply_preset(focus).unwrap();
        assert_eq!(beat.beat_hz(), 10.0);
        assert_eq!(r.controller.state(), PlaybackState::FadingOut);
    }

    #[test]
    fn changes_during_fade_are_remembered_not_scheduled() {
        let mut r = rig(timed(200.0, 196.0, 0));
        r.controller.play().unwrap();
        r.controller.stop();
        let changes = r.backend.log().changes.len();
        r.controller.set_frequencies(100.0, 110.0).unwrap();
        r.controller.set_volume(0.9);
        assert_eq!(r.backend.log().changes.len(), changes);

        advance(&mut r, Duration::from_secs(2));
        r.controller.play().unwrap();
        let opened = r.backend.log().opened.last().copied().unwrap();
        assert_eq!(opened.left.frequency_hz(), 100.0);
        assert_eq!(opened.right.frequency_hz(), 110.0);
        assert_eq!(opened.gain, 0.9);
    }

    #[test]
    fn timer_setting_applies_on_next_start() {
        let mut r = rig(timed(200.0, 196.0, 60));
        r.controller.set_timer_minutes(500);
        assert_eq!(r.controller.timer_secs(), 120 * 60);
        assert_eq!(r.controller.snapshot().remaining_display(), "120:00");

        r.controller.play().unwrap();
        r.controller.set_timer_minutes(1);
        assert_eq!(r.controller.snapshot().remaining_secs, 120 * 60);
    }

    #[test]
    fn next_wakeup_reports_earliest_task() {
        let mut r = rig(timed(200.0, 196.0, 60));
        assert_eq!(r.controller.next_wakeup(), None);
        r.controller.play().unwrap();
        assert_eq!(r.controller.next_wakeup(), Some(Duration::ZERO));
        r.controller.poll();
        let wait = r.controller.next_wakeup().unwrap();
        assert!(wait > Duration::ZERO && wait <= Duration::from_millis(17));
    }

    #[test]
    fn abort_from_playing_skips_fade() {
        let mut r = rig(timed(200.0, 196.0, 60));
        r.controller.play().unwrap();
        assert!(r.controller.abort());
        assert_eq!(r.controller.state(), PlaybackState::Idle);
        assert_eq!(r.backend.log().open_graphs, 0);
        assert_eq!(r.controller.next_wakeup(), None);
        assert!(!r.controller.abort());
    }
}
