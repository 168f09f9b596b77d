//! Error types for the voice command pipeline

use thiserror::Error;

/// Result type alias for voice pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice command pipeline
///
/// Matching failures (no wake phrase, unknown command) are never errors;
/// they surface as dispatch outcomes instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Recognition engine failed to start or stop
    #[error("recognition engine error: {0}")]
    Engine(String),

    /// Microphone access was refused
    #[error("microphone permission denied")]
    PermissionDenied,

    /// Too many consecutive engine failures; the session stopped retrying
    #[error("recognition halted after {errors} consecutive errors")]
    SessionHalted {
        /// Number of consecutive errors observed
        errors: u32,
    },

    /// Speech output failed in the host's synthesizer
    #[error("speech error: {0}")]
    Speech(String),

    /// Host action callback failed
    #[error("action error: {0}")]
    Action(String),
}
