//! Voice command pipeline
//!
//! Final transcripts from a [`RecognitionEngine`] flow through
//! [`RecognitionSession`] into [`DispatchController`], which detects the
//! wake phrase, matches the command and calls back into the host through
//! [`ActionHandler`] and [`SpeechOutputGate`].

mod actions;
mod backoff;
mod commands;
mod dispatch;
mod engine;
mod history;
mod learning;
mod session;
mod speech;
mod status;
mod stdin;
mod wake_word;

pub use actions::{ActionHandler, AppMode, TracingActions};
pub use backoff::RestartPolicy;
pub use commands::{
    CommandAction, CommandMatch, CommandMatcher, CommandPattern, CommandTable, MatchMethod,
    SUGGESTION_FLOOR,
};
pub use dispatch::{DispatchController, DispatchOutcome};
pub use engine::{
    EngineErrorKind, EngineEvent, MicPermission, RecognitionEngine, TranscriptionResult,
};
pub use history::{CommandHistory, DEFAULT_HISTORY_CAPACITY};
pub use learning::{LearningStat, LearningStats, NO_MATCH_BUCKET};
pub use session::RecognitionSession;
pub use speech::{SpeechOutputGate, SpeechSink, TracingSpeech};
pub use status::{SessionState, VoiceStatus};
pub use stdin::{StdinEngine, TYPED_CONFIDENCE, parse_line};
pub use wake_word::{WakeDetection, WakeWordDetector};
