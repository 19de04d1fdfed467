//! Error types for binaura app services
//!
//! Application-level errors that wrap engine errors and add app-specific variants.

use binaura::error::BeatError;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] BeatError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid share link: {0}")]
    InvalidLink(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Engine(BeatError::Network(e))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Engine(BeatError::Io(e))
    }
}

/// Result type alias for binaura app services
pub type Result<T> = std::result::Result<T, AppError>;
