//! Recognition session state machine
//!
//! Keeps the recognition engine listening indefinitely. Engine sessions end
//! on their own all the time (silence timeouts, network hiccups), so an end
//! is answered with a quick restart and transient errors with an
//! exponential backoff. Two things stop the loop for good: an explicit
//! [`RecognitionSession::stop`], and terminal failures (permission denied,
//! too many consecutive errors).
//!
//! ```text
//!            start()                 Started
//! Stopped ────────────▶ Starting ─────────────▶ Running
//!    ▲                     │                       │
//!    │     Error / Ended   │      Error / Ended    │
//!    └─────────────────────┴───────────────────────┘
//!          (restart scheduled unless manually stopped)
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use super::actions::ActionHandler;
use super::backoff::RestartPolicy;
use super::dispatch::{DispatchController, DispatchOutcome};
use super::engine::{EngineErrorKind, EngineEvent, MicPermission, RecognitionEngine, TranscriptionResult};
use super::speech::SpeechSink;
use super::status::{SessionState, VoiceStatus};
use crate::config::RecognitionConfig;
use crate::{Error, Result};

const PERMISSION_DENIED_MESSAGE: &str =
    "Microphone access was denied. Allow microphone access, then start voice control again";

const HALTED_MESSAGE: &str =
    "Voice recognition stopped after repeated errors. Please restart the application";

/// One continuous listening session
pub struct RecognitionSession<E, A, S> {
    id: Uuid,
    engine: E,
    dispatcher: DispatchController<A, S>,
    policy: RestartPolicy,
    restart_delay: Duration,
    confidence_floor: f32,
    fallback_confidence: f32,
    state: SessionState,
    manual_stop: bool,
    error_count: u32,
    mic_permission: MicPermission,
    restart_at: Option<Instant>,
    transcript: String,
    confidence: f32,
    error: Option<String>,
    listening_since: Option<DateTime<Utc>>,
    status: watch::Sender<VoiceStatus>,
}

impl<E, A, S> RecognitionSession<E, A, S>
where
    E: RecognitionEngine,
    A: ActionHandler,
    S: SpeechSink,
{
    #[must_use]
    pub fn new(engine: E, dispatcher: DispatchController<A, S>, config: &RecognitionConfig) -> Self {
        let (status, _) = watch::channel(VoiceStatus::default());
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, engine = engine.name(), "recognition session created");

        Self {
            id,
            engine,
            dispatcher,
            policy: RestartPolicy::from_config(config),
            restart_delay: config.restart_delay(),
            confidence_floor: config.confidence_floor,
            fallback_confidence: config.fallback_confidence,
            state: SessionState::Stopped,
            manual_stop: false,
            error_count: 0,
            mic_permission: MicPermission::default(),
            restart_at: None,
            transcript: String::new(),
            confidence: 0.0,
            error: None,
            listening_since: None,
            status,
        }
    }

    /// Start listening at the user's request
    ///
    /// Clears a previous manual stop or halt.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if microphone access is refused, or
    /// `SessionHalted` if the engine keeps failing to start
    pub async fn start(&mut self) -> Result<()> {
        self.manual_stop = false;
        self.error_count = 0;
        self.error = None;
        tracing::info!(session = %self.id, "voice recognition starting");
        self.begin().await
    }

    async fn begin(&mut self) -> Result<()> {
        if self.state != SessionState::Stopped || self.manual_stop {
            return Ok(());
        }
        self.restart_at = None;

        if self.mic_permission != MicPermission::Granted {
            let mut permission = self.engine.permission().await;
            if permission != MicPermission::Granted {
                permission = self.engine.request_permission().await;
            }
            self.mic_permission = permission;

            if permission == MicPermission::Denied {
                tracing::warn!(session = %self.id, "microphone permission denied");
                return Err(self.halt(PERMISSION_DENIED_MESSAGE, Error::PermissionDenied));
            }
        }

        self.state = SessionState::Starting;
        self.publish();

        if let Err(e) = self.engine.start().await {
            tracing::warn!(session = %self.id, error = %e, "engine failed to start");
            return self.on_error(EngineErrorKind::Unknown);
        }
        Ok(())
    }

    /// Stop listening and cancel every pending timer
    ///
    /// # Errors
    ///
    /// Returns error if the engine fails to stop
    pub async fn stop(&mut self) -> Result<()> {
        self.manual_stop = true;
        self.restart_at = None;
        self.dispatcher.cancel_timers();
        self.state = SessionState::Stopped;
        self.listening_since = None;
        self.publish();
        tracing::info!(session = %self.id, "voice recognition stopped");
        self.engine.stop().await
    }

    /// Release the engine on teardown
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.stop().await {
            tracing::warn!(session = %self.id, error = %e, "engine stop failed during shutdown");
        }
    }

    /// Apply one engine event
    ///
    /// # Errors
    ///
    /// Returns the terminal error when the event halts the session
    pub fn handle_event(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::Started => {
                self.on_start();
                Ok(())
            }
            EngineEvent::Ended => {
                self.on_end();
                Ok(())
            }
            EngineEvent::Error(kind) => self.on_error(kind),
            EngineEvent::Result(result) => {
                self.on_result(&result);
                Ok(())
            }
            EngineEvent::PermissionChanged(permission) => {
                tracing::debug!(session = %self.id, ?permission, "microphone permission changed");
                self.mic_permission = permission;
                self.publish();
                Ok(())
            }
        }
    }

    fn on_start(&mut self) {
        self.state = SessionState::Running;
        self.error_count = 0;
        self.error = None;
        self.mic_permission = MicPermission::Granted;
        self.listening_since = Some(Utc::now());
        self.dispatcher.arm_inactivity();
        tracing::info!(session = %self.id, "listening");
        self.publish();
    }

    fn on_end(&mut self) {
        self.state = SessionState::Stopped;
        self.listening_since = None;
        if !self.manual_stop && self.restart_at.is_none() {
            self.restart_at = Some(Instant::now() + self.restart_delay);
            tracing::debug!(
                session = %self.id,
                delay_ms = duration_ms(self.restart_delay),
                "engine ended, restart scheduled"
            );
        }
        self.publish();
    }

    fn on_error(&mut self, kind: EngineErrorKind) -> Result<()> {
        match kind {
            EngineErrorKind::NoSpeech => {
                tracing::trace!(session = %self.id, "no speech");
                Ok(())
            }
            EngineErrorKind::PermissionDenied => {
                self.mic_permission = MicPermission::Denied;
                tracing::warn!(session = %self.id, "engine reported permission denied");
                Err(self.halt(PERMISSION_DENIED_MESSAGE, Error::PermissionDenied))
            }
            _ if self.manual_stop => {
                tracing::debug!(session = %self.id, kind = %kind, "engine error after stop ignored");
                Ok(())
            }
            _ => {
                self.state = SessionState::Stopped;
                self.listening_since = None;
                if self.policy.exhausted(self.error_count) {
                    self.error_count += 1;
                    tracing::error!(
                        session = %self.id,
                        errors = self.error_count,
                        kind = %kind,
                        "too many recognition errors, giving up"
                    );
                    let errors = self.error_count;
                    return Err(self.halt(HALTED_MESSAGE, Error::SessionHalted { errors }));
                }

                self.error_count += 1;
                let delay = self.policy.delay_for(self.error_count);
                self.restart_at = Some(Instant::now() + delay);
                tracing::warn!(
                    session = %self.id,
                    kind = %kind,
                    errors = self.error_count,
                    delay_ms = duration_ms(delay),
                    "recognition error, restart scheduled"
                );
                self.publish();
                Ok(())
            }
        }
    }

    fn on_result(&mut self, result: &TranscriptionResult) {
        self.transcript.clone_from(&result.text);
        self.confidence = result.effective_confidence(self.fallback_confidence);

        if result.is_final && self.state == SessionState::Running {
            if self.confidence > self.confidence_floor {
                let outcome = self.dispatcher.process(&result.text, self.confidence);
                if let DispatchOutcome::Dispatched(command) = &outcome {
                    tracing::debug!(session = %self.id, action = %command.action, "result dispatched");
                }
            } else {
                tracing::debug!(
                    session = %self.id,
                    confidence = self.confidence,
                    floor = self.confidence_floor,
                    "low confidence result ignored"
                );
            }
        }
        self.publish();
    }

    /// Stop for good, surfacing `message` to the user
    fn halt(&mut self, message: &str, error: Error) -> Error {
        self.manual_stop = true;
        self.restart_at = None;
        self.state = SessionState::Stopped;
        self.listening_since = None;
        self.dispatcher.cancel_timers();
        self.error = Some(message.to_string());
        self.dispatcher.speak(message);
        self.publish();
        error
    }

    /// Earliest pending deadline across restart and dispatch timers
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.restart_at, self.dispatcher.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run every timer whose deadline has passed
    ///
    /// # Errors
    ///
    /// Returns the terminal error if a scheduled restart halts the session
    pub async fn fire_due_timers(&mut self) -> Result<()> {
        if self.restart_at.is_some_and(|t| t <= Instant::now()) {
            self.restart_at = None;
            if !self.manual_stop {
                tracing::debug!(session = %self.id, errors = self.error_count, "restarting recognition");
                self.begin().await?;
            }
        }

        self.dispatcher.fire_due(self.state == SessionState::Running);
        self.publish();
        Ok(())
    }

    /// Observe status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VoiceStatus> {
        self.status.subscribe()
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> VoiceStatus {
        self.status.borrow().clone()
    }

    fn publish(&self) {
        let status = VoiceStatus {
            state: self.state,
            mic_permission: self.mic_permission,
            transcript: self.transcript.clone(),
            confidence: self.confidence,
            last_command: self
                .dispatcher
                .last_command()
                .map(|c| c.action.as_str().to_string()),
            last_command_at: self.dispatcher.last_command_at(),
            listening_since: self.listening_since,
            is_processing_command: self.dispatcher.is_processing(),
            error_count: self.error_count,
            error: self.error.clone(),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether auto-restart is suppressed
    #[must_use]
    pub const fn is_manually_stopped(&self) -> bool {
        self.manual_stop
    }

    #[must_use]
    pub const fn error_count(&self) -> u32 {
        self.error_count
    }

    #[must_use]
    pub const fn mic_permission(&self) -> MicPermission {
        self.mic_permission
    }

    /// Whether an automatic restart is scheduled
    #[must_use]
    pub const fn restart_pending(&self) -> bool {
        self.restart_at.is_some()
    }

    /// When the scheduled restart fires
    #[must_use]
    pub const fn restart_at(&self) -> Option<Instant> {
        self.restart_at
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &DispatchController<A, S> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut DispatchController<A, S> {
        &mut self.dispatcher
    }

    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
