//! Session lifecycle
//!
//! Clock and cooperative scheduler, the countdown timer, and the playback
//! controller that drives the Idle → Playing → FadingOut → Idle cycle.

pub mod clock;
pub mod controller;
pub mod scheduler;
pub mod state;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::PlaybackController;
pub use scheduler::{Cadence, Scheduler, TaskId};
pub use state::{
    ControllerEvent, FadeConfig, PlaybackSession, PlaybackState, SessionConfig, SessionSnapshot,
};
pub use timer::{format_mmss, SessionTimer, TimerEvent};
