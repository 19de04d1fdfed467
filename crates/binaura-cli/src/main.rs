//! Binaura CLI — terminal binaural-beats player

use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use clap::Parser;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::canvas::{Canvas as CanvasWidget, Line as CanvasLine};
use ratatui::widgets::*;

use binaura::audio::types::AudioEvent;
use binaura::audio::{AmbientTrack, AudioEngine, BackgroundTrackPlayer, ToneMixer, TrackCatalog};
use binaura::presets::{self, Preset};
use binaura::session::{
    ControllerEvent, PlaybackController, PlaybackState, SessionSnapshot, SystemClock,
};
use binaura::visual::{Rgba, SharedTrail, TrailCanvas, Visualizer};
use binaura_app::config::files::LOG;
use binaura_app::data::{ensure_config_dir, CustomPreset, PresetStore, Settings};
use binaura_app::feedback::{sink_for, Feedback};
use binaura_app::share::ShareLink;

#[derive(Parser)]
#[command(name = "binaura", about = "Terminal binaural-beats player", version)]
struct Cli {
    /// Left ear frequency in Hz
    #[arg(long)]
    left: Option<f64>,

    /// Right ear frequency in Hz
    #[arg(long)]
    right: Option<f64>,

    /// Master volume (0.0 - 1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Session length in minutes; 0 plays until stopped
    #[arg(long)]
    minutes: Option<u32>,

    /// Ambient background: rain, ocean, forest, white-noise or none
    #[arg(long)]
    background: Option<String>,

    /// Start from a built-in or saved preset
    #[arg(long)]
    preset: Option<String>,

    /// Start from a share link
    #[arg(long)]
    link: Option<String>,

    /// Print the presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Save the configured pair under NAME and exit
    #[arg(long, value_name = "NAME")]
    save_preset: Option<String>,

    /// Send feedback and exit
    #[arg(long, value_name = "TEXT")]
    feedback: Option<String>,
}

/// Timer choices offered by 't'
const TIMER_STEPS: [u32; 7] = [0, 5, 10, 15, 30, 60, 120];

/// Carrier step for Up/Down
const CARRIER_STEP_HZ: f64 = 1.0;

/// Beat step for Left/Right
const BEAT_STEP_HZ: f64 = 0.5;

const VOLUME_STEP: f32 = 0.05;

struct App {
    settings: Settings,
    presets: PresetStore,
    preset_index: Option<usize>,
    preset_name: Option<String>,
    trail: SharedTrail,
    status: String,
    share_url: Option<String>,
    running: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    let mut settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Settings unreadable, using defaults: {}", e);
            Settings::default()
        }
    };
    let mut store = match PresetStore::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Saved presets unreadable: {}", e);
            PresetStore::new()
        }
    };

    let preset_name = match apply_cli(&cli, &mut settings, &store) {
        Ok(name) => name,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.list_presets {
        print_presets(&store);
        return Ok(());
    }

    if let Some(name) = cli.save_preset.as_deref() {
        let preset = match CustomPreset::new(name, settings.left_hz, settings.right_hz) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        println!("Saved {} ({})", preset.name, preset.beat());
        store.add(preset);
        store.save()?;
        return Ok(());
    }

    if let Some(text) = cli.feedback.as_deref() {
        send_feedback(&settings, text);
        return Ok(());
    }

    run_player(settings, store, preset_name)
}

/// Fold command-line overrides into the loaded settings
fn apply_cli(
    cli: &Cli,
    settings: &mut Settings,
    store: &PresetStore,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut preset_name = None;

    if let Some(link) = cli.link.as_deref() {
        let link = ShareLink::parse(link)?;
        settings.set_frequencies(link.left_hz, link.right_hz)?;
    }

    if let Some(name) = cli.preset.as_deref() {
        let (name, left_hz, right_hz) = match presets::find(name) {
            Some(p) => (p.name.to_string(), p.left_hz, p.right_hz),
            None => {
                let p = store.find(name)?;
                (p.name.clone(), p.left_hz, p.right_hz)
            }
        };
        settings.set_frequencies(left_hz, right_hz)?;
        preset_name = Some(name);
    }

    if cli.left.is_some() || cli.right.is_some() {
        settings.set_frequencies(
            cli.left.unwrap_or(settings.left_hz),
            cli.right.unwrap_or(settings.right_hz),
        )?;
        preset_name = None;
    }

    if let Some(volume) = cli.volume {
        settings.set_volume(volume);
    }
    if let Some(minutes) = cli.minutes {
        settings.set_timer_minutes(minutes);
    }
    if let Some(background) = cli.background.as_deref() {
        settings.background = if background.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(background.parse::<AmbientTrack>()?)
        };
    }

    Ok(preset_name)
}

fn print_presets(store: &PresetStore) {
    println!("Built-in presets:");
    for p in presets::all() {
        println!("  {:<16} {:>7} / {:<7} {}", p.name, p.left_hz, p.right_hz, p.description);
    }
    if !store.is_empty() {
        println!("Saved presets:");
        for p in store.list() {
            println!("  {:<16} {:>7} / {:<7} {}", p.name, p.left_hz, p.right_hz, p.beat());
        }
    }
}

fn send_feedback(settings: &Settings, text: &str) {
    let feedback = match Feedback::new(text) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let endpoint = settings.feedback_endpoint.as_deref();
    if endpoint.map_or(true, |e| e.trim().is_empty()) {
        eprintln!("No feedback endpoint configured in settings");
        return;
    }
    // the outcome goes to the log file
    let sink = sink_for(endpoint);
    sink.submit(feedback);
    sink.flush();
    println!("Thanks for the feedback!");
}

/// Log to a file in the config directory; the terminal belongs to the UI
fn init_logging() {
    let Ok(dir) = ensure_config_dir() else {
        return;
    };
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG))
    else {
        return;
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn run_player(
    settings: Settings,
    presets: PresetStore,
    preset_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = match AudioEngine::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Audio error: {}", e);
            std::process::exit(1);
        }
    };

    let config = settings.session_config();
    let trail = TrailCanvas::shared(200.0, 100.0);
    let mixer = ToneMixer::new(
        Box::new(engine.handle()),
        config.left_hz,
        config.right_hz,
        config.volume,
    )?;
    let background = BackgroundTrackPlayer::new(Box::new(engine.handle()), TrackCatalog::default());
    let visualizer = Visualizer::new(Box::new(trail.clone()));
    let mut controller = PlaybackController::new(
        mixer,
        background,
        visualizer,
        Box::new(SystemClock::new()),
        config,
    )?;

    let mut app = App {
        settings,
        presets,
        preset_index: None,
        preset_name,
        trail,
        status: "Ready".to_string(),
        share_url: None,
        running: true,
    };

    // Suppress stderr (ALSA/rodio write directly to fd 2)
    let saved_stderr = unsafe { libc::dup(2) };
    if let Ok(devnull) = std::fs::File::open("/dev/null") {
        unsafe {
            libc::dup2(devnull.as_raw_fd(), 2);
        }
    }

    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let tick_rate = Duration::from_millis(33);

    while app.running {
        let snapshot = controller.snapshot();
        terminal.draw(|f| draw_ui(f, &app, &snapshot))?;

        let timeout = controller
            .next_wakeup()
            .map_or(tick_rate, |wake| wake.min(tick_rate));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key.code, &mut app, &mut controller);
                }
            }
        }

        controller.poll();

        while let Some(ev) = engine.try_recv_event() {
            match ev {
                AudioEvent::AmbientFailed(msg) => controller.report_background_failure(msg),
                AudioEvent::AmbientStarted(id) => log::debug!("Ambient {} looping", id),
                AudioEvent::Error(msg) => app.status = format!("Audio error: {}", msg),
            }
        }

        while let Some(ev) = controller.try_recv_event() {
            match ev {
                ControllerEvent::StateChanged(state) => app.status = state.to_string(),
                ControllerEvent::TimerExpired => app.status = "Session complete".to_string(),
                ControllerEvent::Error(msg) => app.status = format!("Error: {}", msg),
                ControllerEvent::BackgroundFailed(msg) => {
                    app.status = format!("Background unavailable: {}", msg)
                }
                ControllerEvent::TimerTick(_) => {}
            }
        }
    }

    remember(&mut app.settings, &controller.snapshot());
    controller.abort();
    drop(controller);

    // Drop engine while still in alternate screen
    // (rodio prints "Dropping OutputStream..." to stderr on drop)
    engine.shutdown();

    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    if saved_stderr >= 0 {
        unsafe {
            libc::dup2(saved_stderr, 2);
            libc::close(saved_stderr);
        }
    }

    if let Err(e) = app.settings.save() {
        eprintln!("Settings not saved: {}", e);
    }
    if let Err(e) = app.presets.save() {
        eprintln!("Presets not saved: {}", e);
    }

    Ok(())
}

fn handle_key(code: KeyCode, app: &mut App, controller: &mut PlaybackController) {
    let beat = controller.beat();
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Char(' ') => match controller.state() {
            PlaybackState::Idle => {
                if let Err(e) = controller.play() {
                    app.status = format!("Error: {}", e);
                }
            }
            PlaybackState::Playing => {
                controller.stop();
            }
            PlaybackState::FadingOut => {}
        },
        KeyCode::Up | KeyCode::Down => {
            let step = if code == KeyCode::Up {
                CARRIER_STEP_HZ
            } else {
                -CARRIER_STEP_HZ
            };
            retune(app, controller, beat.left_hz + step, beat.right_hz + step);
        }
        KeyCode::Left | KeyCode::Right => {
            let step = if code == KeyCode::Right {
                BEAT_STEP_HZ
            } else {
                -BEAT_STEP_HZ
            };
            retune(app, controller, beat.left_hz, beat.right_hz + step);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            controller.set_volume(controller.snapshot().volume + VOLUME_STEP);
        }
        KeyCode::Char('-') => {
            controller.set_volume(controller.snapshot().volume - VOLUME_STEP);
        }
        KeyCode::Char('b') => {
            let next = AmbientTrack::cycle(controller.snapshot().background);
            controller.select_background(next);
        }
        KeyCode::Char('t') => {
            let minutes = (controller.timer_secs() / 60) as u32;
            let next = TIMER_STEPS
                .iter()
                .copied()
                .find(|&m| m > minutes)
                .unwrap_or(TIMER_STEPS[0]);
            controller.set_timer_minutes(next);
        }
        KeyCode::Char('p') => {
            let all = presets::all();
            let index = app.preset_index.map_or(0, |i| (i + 1) % all.len());
            apply_builtin(app, controller, index, &all[index]);
        }
        KeyCode::Char('s') => {
            let name = format!("Custom {}", app.presets.len() + 1);
            match CustomPreset::new(&name, beat.left_hz, beat.right_hz) {
                Ok(preset) => {
                    app.status = format!("Saved {}", preset.name);
                    app.preset_name = Some(preset.name.clone());
                    app.presets.add(preset);
                    if let Err(e) = app.presets.save() {
                        app.status = format!("Preset not saved: {}", e);
                    }
                }
                Err(e) => app.status = format!("Error: {}", e),
            }
        }
        KeyCode::Char('l') => {
            match ShareLink::new(beat.left_hz, beat.right_hz).to_url(&app.settings.share_base) {
                Ok(url) => app.share_url = Some(url),
                Err(e) => app.status = format!("Error: {}", e),
            }
        }
        _ => {}
    }
}

fn retune(app: &mut App, controller: &mut PlaybackController, left_hz: f64, right_hz: f64) {
    match controller.set_frequencies(left_hz, right_hz) {
        Ok(_) => {
            app.preset_name = None;
            refresh_link(app, controller);
        }
        Err(e) => app.status = format!("Error: {}", e),
    }
}

/// Keep a displayed share link in step with the current pair
fn refresh_link(app: &mut App, controller: &PlaybackController) {
    if app.share_url.is_none() {
        return;
    }
    let beat = controller.beat();
    app.share_url = ShareLink::new(beat.left_hz, beat.right_hz)
        .to_url(&app.settings.share_base)
        .ok();
}

fn apply_builtin(
    app: &mut App,
    controller: &mut PlaybackController,
    index: usize,
    preset: &Preset,
) {
    match controller.apply_preset(preset) {
        Ok(_) => {
            app.preset_index = Some(index);
            app.preset_name = Some(preset.name.to_string());
            refresh_link(app, controller);
        }
        Err(e) => app.status = format!("Error: {}", e),
    }
}

/// Copy the live configuration back into the settings
fn remember(settings: &mut Settings, snapshot: &SessionSnapshot) {
    if let Err(e) = settings.set_frequencies(snapshot.left_hz, snapshot.right_hz) {
        log::warn!("Not saving frequencies: {}", e);
    }
    settings.set_volume(snapshot.volume);
    settings.set_timer_minutes((snapshot.timer_secs / 60) as u32);
    settings.background = snapshot.background;
}

fn draw_ui(f: &mut Frame, app: &App, snapshot: &SessionSnapshot) {
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Binaura v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Length(6), // beat + session
        Constraint::Min(6),    // waveform
        Constraint::Length(2), // help bar
    ])
    .split(inner);

    draw_beat(f, app, snapshot, chunks[0]);
    draw_waveform(f, app, chunks[1]);
    draw_help(f, snapshot, chunks[2]);
}

fn draw_beat(f: &mut Frame, app: &App, snapshot: &SessionSnapshot, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);

    let state_color = match snapshot.state {
        PlaybackState::Playing => Color::Green,
        PlaybackState::FadingOut => Color::Yellow,
        PlaybackState::Idle => Color::DarkGray,
    };
    let timer = if snapshot.timer_secs == 0 {
        "∞".to_string()
    } else {
        snapshot.remaining_display()
    };
    let background = snapshot
        .background
        .map_or("None", |track| track.label());
    let preset = app.preset_name.as_deref().unwrap_or("---");

    let mut text = vec![
        Line::from(vec![
            Span::styled("  Left: ", label),
            Span::styled(format!("{} Hz", snapshot.left_hz), value.bold()),
            Span::raw("  "),
            Span::styled("Right: ", label),
            Span::styled(format!("{} Hz", snapshot.right_hz), value.bold()),
            Span::raw("  "),
            Span::styled("Beat: ", label),
            Span::styled(
                format!("{:.2} Hz", snapshot.beat_hz),
                Style::default().fg(Color::Magenta).bold(),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Preset: ", label),
            Span::styled(preset.to_string(), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled("Background: ", label),
            Span::styled(background, value),
        ]),
        Line::from(vec![
            Span::styled("  State: ", label),
            Span::styled(snapshot.state.to_string(), Style::default().fg(state_color)),
            Span::raw("  "),
            Span::styled("Timer: ", label),
            Span::styled(timer, Style::default().fg(Color::Cyan).bold()),
            Span::raw("  "),
            Span::styled("Status: ", label),
            Span::styled(app.status.clone(), value),
        ]),
    ];
    if let Some(url) = &app.share_url {
        text.push(Line::from(vec![
            Span::styled("  Share: ", label),
            Span::styled(url.clone(), Style::default().fg(Color::Blue).underlined()),
        ]));
    }

    let block = Block::default()
        .title(" Session ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_waveform(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Waveform ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    // Braille cells are 2x4 dots
    let width = (inner.width.max(1) as f64) * 2.0;
    let height = (inner.height.max(1) as f64) * 4.0;

    let mut trail = app.trail.lock().unwrap_or_else(|e| e.into_inner());
    trail.resize(width, height);
    let background = trail.background();

    let widget = CanvasWidget::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for trace in trail.traces() {
                let color = blend(trace.color, background, trace.opacity);
                for pair in trace.points.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: pair[0].x,
                        y1: height - pair[0].y,
                        x2: pair[1].x,
                        y2: height - pair[1].y,
                        color,
                    });
                }
            }
        });
    f.render_widget(widget, area);
}

/// Mix a stroke colour over the background by its remaining opacity
fn blend(stroke: Rgba, background: Rgba, opacity: f32) -> Color {
    let mix = |s: u8, b: u8| -> u8 {
        let a = opacity.clamp(0.0, 1.0);
        (s as f32 * a + b as f32 * (1.0 - a)).round() as u8
    };
    Color::Rgb(
        mix(stroke.r, background.r),
        mix(stroke.g, background.g),
        mix(stroke.b, background.b),
    )
}

fn draw_help(f: &mut Frame, snapshot: &SessionSnapshot, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let help = Line::from(vec![
        Span::styled("  'space' ", key),
        Span::raw("play/stop  |  "),
        Span::styled("↑/↓ ", key),
        Span::raw("carrier  |  "),
        Span::styled("←/→ ", key),
        Span::raw("beat  |  "),
        Span::styled("'p' ", key),
        Span::raw("preset  |  "),
        Span::styled("'b' ", key),
        Span::raw("background  |  "),
        Span::styled("'t' ", key),
        Span::raw("timer  |  "),
        Span::styled("'s' ", key),
        Span::raw("save  |  "),
        Span::styled("'l' ", key),
        Span::raw("link  |  "),
        Span::styled("'q' ", key),
        Span::raw("quit  |  "),
        Span::styled(
            format!("Vol: {}%", (snapshot.volume * 100.0).round() as u32),
            Style::default().fg(Color::Cyan).bold(),
        ),
    ]);

    f.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}
