//! Configuration constants for the binaura engine

/// Audio graph and synthesis configuration
pub mod audio {
    /// Pan position of the left tone (fully left)
    pub const LEFT_PAN: f32 = -1.0;

    /// Pan position of the right tone (fully right)
    pub const RIGHT_PAN: f32 = 1.0;

    /// Frames per automation/analysis block, matching the Web Audio render quantum
    pub const RENDER_QUANTUM: usize = 128;

    /// Rate the tone graph renders at; rodio resamples to the device rate
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

    /// Glide time for master-volume changes while playing (seconds)
    pub const VOLUME_GLIDE_SECS: f64 = 0.02;

    /// Default master volume (0.0 - 1.0)
    pub const DEFAULT_VOLUME: f32 = 0.5;

    /// Analyser window size in samples
    pub const ANALYSER_FFT_SIZE: usize = 2048;

    /// Samples read per visualization frame (half the analyser window)
    pub const WAVEFORM_LEN: usize = ANALYSER_FFT_SIZE / 2;
}

/// Fade-out configuration
pub mod fade {
    /// Duration of the exponential gain ramp on stop (seconds)
    pub const RAMP_SECS: f64 = 1.5;

    /// Delay between stop and graph teardown (milliseconds)
    pub const TEARDOWN_DELAY_MS: u64 = 1600;

    /// Ramp target; exponential ramps cannot reach zero
    pub const FLOOR_GAIN: f32 = 0.01;
}

/// Session timer configuration
pub mod timer {
    /// Countdown resolution (milliseconds)
    pub const TICK_MS: u64 = 1000;

    /// Default session length (minutes)
    pub const DEFAULT_MINUTES: u32 = 15;

    /// Upper bound of the timer slider (minutes)
    pub const MAX_MINUTES: u32 = 120;
}

/// Visualizer configuration
pub mod visual {
    /// Frame period (~60 Hz display refresh), in microseconds
    pub const FRAME_PERIOD_MICROS: u64 = 16_667;

    /// Translucent background fill, producing the trailing effect
    pub const BACKGROUND: (u8, u8, u8, f32) = (15, 23, 42, 0.8);

    /// Trace stroke colour (#8b5cf6)
    pub const STROKE: (u8, u8, u8) = (0x8b, 0x5c, 0xf6);

    /// Trace stroke width
    pub const LINE_WIDTH: f32 = 4.0;

    /// Traces fainter than this are dropped from a trail canvas
    pub const MIN_TRACE_OPACITY: f32 = 0.02;
}

/// Background (ambient) track configuration
pub mod background {
    /// Fixed playback volume for ambient tracks
    pub const VOLUME: f32 = 0.3;
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("Binaura/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds
    pub const READ_TIMEOUT_SECS: u64 = 30;
}
