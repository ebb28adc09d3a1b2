//! Error types for Playhead Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Command validation errors
    #[error("volume is not a number between 0 and 1: {0}")]
    InvalidVolume(f64),

    #[error("percent is not a number between 0 and 1: {0}")]
    InvalidPercent(f64),

    #[error("playback rate must be a positive number: {0}")]
    InvalidPlaybackRate(f64),

    #[error("time is not a number: {0}")]
    InvalidTime(f64),

    #[error("frame rate must be a positive number: {0}")]
    InvalidFrameRate(f64),

    // Action errors
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    // Timecode errors
    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Session errors
    #[error("Player session is closed")]
    SessionClosed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid action error
    pub fn action(msg: impl Into<String>) -> Self {
        Error::InvalidAction(msg.into())
    }

    /// Returns true if the error means the caller broke the API contract
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidVolume(_)
                | Error::InvalidPercent(_)
                | Error::InvalidPlaybackRate(_)
                | Error::InvalidTime(_)
                | Error::InvalidFrameRate(_)
                | Error::InvalidAction(_)
        )
    }

    /// Returns the error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidVolume(_) => "INVALID_VOLUME",
            Error::InvalidPercent(_) => "INVALID_PERCENT",
            Error::InvalidPlaybackRate(_) => "INVALID_PLAYBACK_RATE",
            Error::InvalidTime(_) => "INVALID_TIME",
            Error::InvalidFrameRate(_) => "INVALID_FRAME_RATE",
            Error::InvalidAction(_) => "INVALID_ACTION",
            Error::InvalidTimecode(_) => "INVALID_TIMECODE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::SessionClosed => "SESSION_CLOSED",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
