//! Audio subsystem
//!
//! Parameter automation, tone synthesis, the waveform analyser, the
//! tone mixer and background player, and the rodio output engine.

pub mod analyser;
pub mod background;
pub mod engine;
pub mod graph;
pub mod mixer;
pub mod param;
pub mod synth;
pub mod types;

pub use analyser::{new_shared_waveform, SharedWaveform, WaveformTap};
pub use background::{AmbientTrack, BackgroundTrackPlayer, TrackCatalog};
pub use engine::{AudioEngine, EngineHandle};
pub use graph::{AmbientOutput, AudioBackend};
pub use mixer::{MixerState, ToneMixer};
pub use param::ParamTimeline;
pub use synth::ToneVoice;
pub use types::{
    AudioCommand, AudioEvent, BeatDescriptor, GraphSpec, ParamChange, ParamTarget,
    ScheduledChange, Side, ToneChannel, TrackLocator,
};
