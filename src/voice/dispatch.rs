//! Turns finalized transcripts into host actions
//!
//! [`DispatchController`] owns the command history, the learning counters
//! and the two timers that shape dispatch: a cool-down that drops results
//! while a command is being handled, and a recurring inactivity prompt.
//! Timers are plain deadlines; the owner polls [`DispatchController::next_deadline`]
//! and calls [`DispatchController::fire_due`] when it passes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use super::actions::{ActionHandler, AppMode};
use super::commands::{CommandAction, CommandMatch, CommandMatcher, CommandTable};
use super::history::CommandHistory;
use super::learning::{LearningStats, NO_MATCH_BUCKET};
use super::speech::{SpeechOutputGate, SpeechSink};
use super::wake_word::WakeWordDetector;
use crate::config::Config;

/// Settings that can be changed by voice
const SETTING_NAMES: [&str; 3] = ["volume", "speed", "sensitivity"];

/// Values accepted for a voice setting change
const SETTING_VALUES: [&str; 4] = ["up", "down", "on", "off"];

/// What happened to one transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A previous command is still cooling down
    Busy,
    /// Same text as one of the last few transcripts
    Duplicate,
    /// No wake phrase
    Ignored { wake_confidence: f64 },
    /// Command recognized and handed to the host
    Dispatched(CommandMatch),
    /// Command recognized but the host callback failed
    Failed { action: CommandAction, error: String },
    /// Wake phrase heard but no command matched
    Unmatched { suggestion: Option<String> },
}

/// Routes wake-prefixed transcripts to an [`ActionHandler`]
pub struct DispatchController<A, S> {
    wake: WakeWordDetector,
    matcher: CommandMatcher,
    actions: A,
    speech: SpeechOutputGate<S>,
    history: CommandHistory,
    learning: LearningStats,
    mode: AppMode,
    duplicate_window: usize,
    cooldown: Duration,
    inactivity_prompt: Duration,
    cooldown_until: Option<Instant>,
    inactivity_at: Option<Instant>,
    last_command: Option<CommandMatch>,
    last_command_at: Option<DateTime<Utc>>,
}

impl<A: ActionHandler, S: SpeechSink> DispatchController<A, S> {
    /// Controller using the built-in command table
    #[must_use]
    pub fn new(config: &Config, actions: A, sink: S) -> Self {
        Self::with_table(config, CommandTable::default(), actions, sink)
    }

    /// Controller using a custom command table
    #[must_use]
    pub fn with_table(config: &Config, table: CommandTable, actions: A, sink: S) -> Self {
        let rec = &config.recognition;
        Self {
            wake: WakeWordDetector::new(&config.wake_word, rec.wake_threshold),
            matcher: CommandMatcher::new(table, rec.command_threshold, rec.adaptive_learning),
            actions,
            speech: SpeechOutputGate::new(sink, config.speech.repeat_window()),
            history: CommandHistory::with_capacity(rec.history_capacity),
            learning: LearningStats::new(),
            mode: AppMode::default(),
            duplicate_window: rec.duplicate_window,
            cooldown: rec.cooldown(),
            inactivity_prompt: rec.inactivity_prompt(),
            cooldown_until: None,
            inactivity_at: None,
            last_command: None,
            last_command_at: None,
        }
    }

    /// Handle one finalized transcript
    pub fn process(&mut self, transcript: &str, confidence: f32) -> DispatchOutcome {
        if self.is_processing() {
            tracing::debug!(transcript, "dispatch in flight, dropping result");
            return DispatchOutcome::Busy;
        }

        if self
            .history
            .is_recent_duplicate(transcript, self.duplicate_window)
        {
            tracing::debug!(transcript, "duplicate transcript");
            return DispatchOutcome::Duplicate;
        }

        let recent = self.history.recent(self.history.len());
        self.history.push(transcript);
        self.arm_inactivity();

        let wake = self.wake.detect(transcript, &recent);
        if !wake.activated {
            tracing::trace!(transcript, wake_confidence = wake.confidence, "no wake phrase");
            return DispatchOutcome::Ignored {
                wake_confidence: wake.confidence,
            };
        }

        self.cooldown_until = Some(Instant::now() + self.cooldown);
        tracing::info!(
            residual = %wake.residual,
            wake_confidence = wake.confidence,
            confidence,
            "wake phrase detected"
        );

        match self
            .matcher
            .match_command(&wake.residual, self.mode, &self.learning)
        {
            Some(command) => self.dispatch(command, &wake.residual),
            None => self.unmatched(&wake.residual),
        }
    }

    fn dispatch(&mut self, command: CommandMatch, residual: &str) -> DispatchOutcome {
        let action = command.action;
        let (result, confirmation) = match action {
            CommandAction::Camera => (
                self.actions.on_camera_action(residual),
                "Opening camera".to_string(),
            ),
            CommandAction::Navigation => (
                self.actions.on_navigation_action(residual),
                "Starting navigation".to_string(),
            ),
            CommandAction::Emergency => (
                self.actions.on_emergency_action(residual),
                "Emergency mode activated".to_string(),
            ),
            CommandAction::Settings => match parse_setting(residual) {
                Some((setting, value)) => (
                    self.actions.on_settings_change(setting, value),
                    format!("Setting {setting} {value}"),
                ),
                None => (
                    self.actions.on_mode_change(AppMode::Settings),
                    "Opening settings".to_string(),
                ),
            },
            CommandAction::Status => (Ok(()), self.status_report()),
            CommandAction::Help => (Ok(()), self.help_text()),
        };

        match result {
            Ok(()) => {
                if let Some(mode) = action.mode() {
                    self.mode = mode;
                }
                self.learning.record_success(action.as_str());
                tracing::info!(
                    %action,
                    confidence = command.confidence,
                    method = ?command.method,
                    "command dispatched"
                );
                self.speech.speak(&confirmation);
                self.last_command = Some(command.clone());
                self.last_command_at = Some(Utc::now());
                DispatchOutcome::Dispatched(command)
            }
            Err(e) => {
                self.learning.record_failure(action.as_str());
                tracing::warn!(%action, error = %e, "command action failed");
                self.speech.speak(&format!("Sorry, {action} is not available right now"));
                DispatchOutcome::Failed {
                    action,
                    error: e.to_string(),
                }
            }
        }
    }

    fn unmatched(&mut self, residual: &str) -> DispatchOutcome {
        self.learning.record_failure(NO_MATCH_BUCKET);
        let suggestion = if residual.is_empty() {
            None
        } else {
            self.matcher.suggest(residual)
        };

        let message = suggestion.as_ref().map_or_else(
            || {
                format!(
                    "Sorry, I didn't catch that. Say \"{} help\" to hear the commands",
                    self.wake.phrase()
                )
            },
            |phrase| format!("Did you mean \"{phrase}\"?"),
        );
        tracing::debug!(residual, suggestion = ?suggestion, "no command matched");
        self.speech.speak(&message);

        DispatchOutcome::Unmatched { suggestion }
    }

    fn status_report(&self) -> String {
        format!("Voice control is active in {} mode", self.mode)
    }

    fn help_text(&self) -> String {
        format!(
            "Say \"{}\" followed by one of: {}",
            self.wake.phrase(),
            self.matcher.table().action_names().join(", ")
        )
    }

    /// Speak through the output gate
    pub fn speak(&mut self, text: &str) -> bool {
        self.speech.speak(text)
    }

    /// Earliest pending timer deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.cooldown_until, self.inactivity_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run every timer whose deadline has passed
    ///
    /// The inactivity prompt is only spoken while `running` and idle; it
    /// re-arms itself either way as long as the session runs.
    pub fn fire_due(&mut self, running: bool) {
        let now = Instant::now();

        if self.cooldown_until.is_some_and(|t| t <= now) {
            self.cooldown_until = None;
            tracing::trace!("dispatch cool-down elapsed");
        }

        if self.inactivity_at.is_some_and(|t| t <= now) {
            if running {
                if !self.is_processing() {
                    let prompt = format!(
                        "Still listening. Say \"{}\" followed by a command",
                        self.wake.phrase()
                    );
                    self.speech.speak(&prompt);
                }
                self.inactivity_at = Some(now + self.inactivity_prompt);
            } else {
                self.inactivity_at = None;
            }
        }
    }

    /// Restart the inactivity timer
    pub fn arm_inactivity(&mut self) {
        self.inactivity_at = Some(Instant::now() + self.inactivity_prompt);
    }

    /// Drop every pending timer and release the dispatch guard
    pub fn cancel_timers(&mut self) {
        self.cooldown_until = None;
        self.inactivity_at = None;
        self.speech.cancel();
    }

    /// Whether a dispatch is still cooling down
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.cooldown_until.is_some_and(|t| Instant::now() < t)
    }

    #[must_use]
    pub const fn last_command(&self) -> Option<&CommandMatch> {
        self.last_command.as_ref()
    }

    /// Wall-clock time of the last successful dispatch
    #[must_use]
    pub const fn last_command_at(&self) -> Option<DateTime<Utc>> {
        self.last_command_at
    }

    #[must_use]
    pub const fn mode(&self) -> AppMode {
        self.mode
    }

    /// Tell the controller which mode the host UI is showing
    pub fn set_mode(&mut self, mode: AppMode) {
        self.mode = mode;
    }

    #[must_use]
    pub const fn learning(&self) -> &LearningStats {
        &self.learning
    }

    #[must_use]
    pub const fn history(&self) -> &CommandHistory {
        &self.history
    }

    #[must_use]
    pub const fn actions(&self) -> &A {
        &self.actions
    }
}

/// Extract `(setting, value)` from text like "volume up" or "speak faster"
fn parse_setting(residual: &str) -> Option<(&'static str, &'static str)> {
    let words: Vec<&str> = residual.split_whitespace().collect();
    let named = |candidates: &[&'static str]| {
        candidates
            .iter()
            .copied()
            .find(|c| words.contains(c))
    };

    if let (Some(setting), Some(value)) = (named(&SETTING_NAMES), named(&SETTING_VALUES)) {
        return Some((setting, value));
    }

    words.iter().find_map(|w| match *w {
        "louder" => Some(("volume", "up")),
        "quieter" | "softer" => Some(("volume", "down")),
        "faster" => Some(("speed", "up")),
        "slower" => Some(("speed", "down")),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::actions::TracingActions;
    use crate::voice::speech::TracingSpeech;

    fn controller() -> DispatchController<TracingActions, TracingSpeech> {
        DispatchController::new(&Config::default(), TracingActions, TracingSpeech)
    }

    #[test]
    fn parses_settings() {
        assert_eq!(parse_setting("volume up"), Some(("volume", "up")));
        assert_eq!(parse_setting("turn sensitivity off"), Some(("sensitivity", "off")));
        assert_eq!(parse_setting("speak faster"), Some(("speed", "up")));
        assert_eq!(parse_setting("settings"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_speech_does_not_hold_guard() {
        let mut c = controller();
        assert!(matches!(c.process("what a nice day", 0.9), DispatchOutcome::Ignored { .. }));
        assert!(!c.is_processing());
        assert!(matches!(c.process("hey vision camera", 0.9), DispatchOutcome::Dispatched(_)));
        assert!(c.is_processing());
        assert_eq!(c.mode(), AppMode::Camera);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_releases_guard() {
        let mut c = controller();
        c.process("hey vision camera", 0.9);
        assert_eq!(c.process("hey vision status", 0.9), DispatchOutcome::Busy);

        tokio::time::advance(Duration::from_millis(2001)).await;
        c.fire_due(true);
        assert!(matches!(c.process("hey vision status", 0.9), DispatchOutcome::Dispatched(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn unmatched_records_no_match_failure() {
        let mut c = controller();
        let outcome = c.process("hey vision xylophone quartz", 0.9);
        assert!(matches!(outcome, DispatchOutcome::Unmatched { .. }));
        assert_eq!(c.learning().get(NO_MATCH_BUCKET).failure_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_clears_deadlines() {
        let mut c = controller();
        c.arm_inactivity();
        c.process("hey vision help", 0.9);
        assert!(c.next_deadline().is_some());
        c.cancel_timers();
        assert!(c.next_deadline().is_none());
        assert!(!c.is_processing());
    }
}
