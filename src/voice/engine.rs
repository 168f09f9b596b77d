//! Speech recognition engine interface
//!
//! The engine itself (audio capture plus transcription) lives outside this
//! crate. The session only needs a start/stop control pair, a permission
//! query, and a stream of [`EngineEvent`]s.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Microphone permission as reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicPermission {
    /// Access granted
    Granted,
    /// Access refused by the user or platform
    Denied,
    /// Not yet decided; starting will prompt the user
    #[default]
    Prompt,
}

/// Error kinds reported by the recognition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineErrorKind {
    /// Silence timeout; a benign pause rather than a failure
    NoSpeech,
    /// Recognition aborted (often by a concurrent start/stop)
    Aborted,
    /// Audio device could not be captured
    AudioCapture,
    /// Network failure reaching the transcription service
    Network,
    /// Microphone permission denied
    PermissionDenied,
    /// Anything else
    Unknown,
}

impl EngineErrorKind {
    /// Whether the error is retried automatically with backoff
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Aborted | Self::AudioCapture | Self::Network | Self::Unknown
        )
    }
}

impl FromStr for EngineErrorKind {
    type Err = std::convert::Infallible;

    /// Parse an engine error name; unrecognised names map to `Unknown`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" | "permission-denied" | "service-not-allowed" => Self::PermissionDenied,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::PermissionDenied => "permission-denied",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One recognition result from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Recognised text
    pub text: String,

    /// Whether the engine considers this result final
    pub is_final: bool,

    /// Engine-reported confidence, if available
    pub confidence: Option<f32>,
}

impl TranscriptionResult {
    /// Create a final result
    #[must_use]
    pub fn final_text(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            confidence: Some(confidence),
        }
    }

    /// Create an interim result
    #[must_use]
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            confidence: None,
        }
    }

    /// Engine confidence clamped to [0, 1], or `fallback` when unavailable
    #[must_use]
    pub fn effective_confidence(&self, fallback: f32) -> f32 {
        self.confidence
            .filter(|c| c.is_finite())
            .unwrap_or(fallback)
            .clamp(0.0, 1.0)
    }
}

/// Events emitted by the recognition engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine began listening
    Started,
    /// Engine stopped listening (normal end of a recognition cycle)
    Ended,
    /// Engine reported an error
    Error(EngineErrorKind),
    /// A transcription result
    Result(TranscriptionResult),
    /// The platform changed the microphone permission
    PermissionChanged(MicPermission),
}

/// Control surface of a speech recognition engine
///
/// Implementations report progress asynchronously through an
/// `mpsc::Sender<EngineEvent>` they own; these methods only request
/// transitions.
#[async_trait]
pub trait RecognitionEngine: Send {
    /// Engine name for logging
    fn name(&self) -> &'static str;

    /// Begin listening
    async fn start(&mut self) -> Result<()>;

    /// Stop listening and release the audio device
    async fn stop(&mut self) -> Result<()>;

    /// Query the current microphone permission without prompting
    async fn permission(&self) -> MicPermission;

    /// Ask the user for microphone access
    async fn request_permission(&mut self) -> MicPermission;
}
