//! Observable session state for display

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::engine::MicPermission;

/// Recognition session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Stopped,
    Starting,
    Running,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// Snapshot published after every session transition
///
/// Consumers only read this; nothing flows back into the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoiceStatus {
    pub state: SessionState,
    pub mic_permission: MicPermission,
    /// Latest transcript, interim or final
    pub transcript: String,
    pub confidence: f32,
    /// Action name of the last dispatched command
    pub last_command: Option<String>,
    pub last_command_at: Option<DateTime<Utc>>,
    /// When the engine last reported it was listening
    pub listening_since: Option<DateTime<Utc>>,
    pub is_processing_command: bool,
    pub error_count: u32,
    /// User-facing error message, if the session halted
    pub error: Option<String>,
}
