//! Spoken feedback
//!
//! Text-to-speech itself lives in the host; this module only decides what
//! reaches it. [`SpeechOutputGate`] suppresses empty and repeated prompts
//! and never lets two utterances overlap.

use std::time::Duration;

use tokio::time::Instant;

use crate::Result;

/// Text-to-speech output device
pub trait SpeechSink: Send {
    /// Begin speaking `text`
    ///
    /// # Errors
    ///
    /// Returns error if the device rejected the utterance
    fn speak(&mut self, text: &str) -> Result<()>;

    /// Cancel the utterance in progress, if any
    fn cancel(&mut self);

    /// Whether an utterance is currently playing
    fn is_speaking(&self) -> bool;
}

/// Filters speech requests before they reach a [`SpeechSink`]
pub struct SpeechOutputGate<S> {
    sink: S,
    repeat_window: Duration,
    last: Option<(String, Instant)>,
}

impl<S: SpeechSink> SpeechOutputGate<S> {
    #[must_use]
    pub const fn new(sink: S, repeat_window: Duration) -> Self {
        Self {
            sink,
            repeat_window,
            last: None,
        }
    }

    /// Speak `text` unless it is empty or a repeat
    ///
    /// Different text interrupts the current utterance. Returns whether the
    /// sink was asked to speak.
    pub fn speak(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let same_as_last = self.last.as_ref().is_some_and(|(last, _)| last == text);
        if self.sink.is_speaking() {
            if same_as_last {
                tracing::trace!(text, "already speaking this text");
                return false;
            }
            self.sink.cancel();
        } else if same_as_last
            && self
                .last
                .as_ref()
                .is_some_and(|(_, at)| at.elapsed() < self.repeat_window)
        {
            tracing::trace!(text, "suppressed repeated speech");
            return false;
        }

        match self.sink.speak(text) {
            Ok(()) => {
                tracing::debug!(text, "speaking");
                self.last = Some((text.to_string(), Instant::now()));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "speech output failed");
                false
            }
        }
    }

    /// Stop the current utterance
    pub fn cancel(&mut self) {
        if self.sink.is_speaking() {
            self.sink.cancel();
        }
    }

    /// Most recently spoken text
    #[must_use]
    pub fn last_spoken(&self) -> Option<&str> {
        self.last.as_ref().map(|(text, _)| text.as_str())
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}

/// Sink that writes utterances to the log; used by the CLI
#[derive(Debug, Default)]
pub struct TracingSpeech;

impl SpeechSink for TracingSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        tracing::info!(target: "vision_voice::speech", "{text}");
        Ok(())
    }

    fn cancel(&mut self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}
