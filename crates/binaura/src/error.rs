//! Error types for binaura
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the binaura engine
#[derive(Error, Debug)]
pub enum BeatError {
    #[error("Invalid frequency: {0} Hz (must be a positive, finite number)")]
    InvalidFrequency(f64),

    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),

    #[error("Background track unavailable: {0}")]
    BackgroundUnavailable(String),

    #[error("Unknown background track: {0}")]
    UnknownTrack(String),

    #[error("{}", friendly_network_error(.0))]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for binaura
pub type Result<T> = std::result::Result<T, BeatError>;

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("Could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "Could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "Connection timed out".to_string();
    }
    if let Some(status) = e.status() {
        return format!("Server returned {status}");
    }
    format!("Network error: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_frequency_message_includes_value() {
        let err = BeatError::InvalidFrequency(-3.5);
        assert!(err.to_string().contains("-3.5"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing clip");
        let err: BeatError = io.into();
        assert!(matches!(err, BeatError::Io(_)));
        assert!(err.to_string().contains("missing clip"));
    }

    #[test]
    fn audio_unavailable_display() {
        let err = BeatError::AudioUnavailable("no device".into());
        assert_eq!(err.to_string(), "Audio output unavailable: no device");
    }
}
