//! Vision Voice - hands-free voice commands for accessibility assistants
//!
//! This library provides an always-listening command pipeline:
//! - Text normalization and fuzzy similarity scoring
//! - Wake phrase detection tolerant of misrecognition
//! - Command matching with context, mode and learning boosts
//! - A self-healing recognition session with exponential backoff
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │         Recognition engine (speech-to-text)          │
//! │      Started │ Ended │ Error │ Result │ Permission   │
//! └────────────────────┬────────────────────────────────┘
//!                      │ EngineEvent
//! ┌────────────────────▼────────────────────────────────┐
//! │               RecognitionSession                     │
//! │   state machine │ backoff │ confidence gate          │
//! └────────────────────┬────────────────────────────────┘
//!                      │ final transcript
//! ┌────────────────────▼────────────────────────────────┐
//! │               DispatchController                     │
//! │  Wake Word │ Command Matcher │ History │ Learning    │
//! └──────────┬──────────────────────────┬───────────────┘
//!            │                          │
//!      ActionHandler             SpeechOutputGate
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod matching;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
