//! Binaura — binaural-beat synthesis and timed playback
//!
//! Two hard-panned sine tones behind a shared master gain, an optional
//! looping ambient clip, a countdown that ends the session with a fade, and
//! a real-time waveform trace.
//!
//! ## Quick start
//!
//! ```no_run
//! use binaura::audio::{AudioEngine, BackgroundTrackPlayer, ToneMixer, TrackCatalog};
//! use binaura::session::{PlaybackController, SessionConfig, SystemClock};
//! use binaura::visual::{TrailCanvas, Visualizer};
//!
//! # fn main() -> binaura::error::Result<()> {
//! let engine = AudioEngine::new()?;
//! let mixer = ToneMixer::new(Box::new(engine.handle()), 200.0, 196.0, 0.5)?;
//! let background = BackgroundTrackPlayer::new(Box::new(engine.handle()), TrackCatalog::default());
//! let visualizer = Visualizer::new(Box::new(TrailCanvas::shared(80.0, 20.0)));
//! let mut controller = PlaybackController::new(
//!     mixer,
//!     background,
//!     visualizer,
//!     Box::new(SystemClock::new()),
//!     SessionConfig::default(),
//! )?;
//! controller.play()?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod presets;
pub mod session;
pub mod visual;

#[cfg(test)]
pub(crate) mod testing;
