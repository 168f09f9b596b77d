//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vision_voice::voice::{
    ActionHandler, AppMode, DispatchController, MicPermission, RecognitionEngine,
    RecognitionSession, SpeechSink,
};
use vision_voice::{Config, Error, Result};

/// Calls observed by [`FakeEngine`]
#[derive(Debug, Default)]
pub struct EngineLog {
    pub starts: usize,
    pub stops: usize,
    pub permission_requests: usize,
}

/// Engine double; events are fed to the session by the test
#[derive(Clone)]
pub struct FakeEngine {
    pub log: Arc<Mutex<EngineLog>>,
    pub permission: MicPermission,
    pub grant_on_request: MicPermission,
    pub fail_start: bool,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            log: Arc::default(),
            permission: MicPermission::Granted,
            grant_on_request: MicPermission::Granted,
            fail_start: false,
        }
    }
}

impl FakeEngine {
    pub fn starts(&self) -> usize {
        self.log.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }
}

#[async_trait]
impl RecognitionEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn start(&mut self) -> Result<()> {
        self.log.lock().unwrap().starts += 1;
        if self.fail_start {
            return Err(Error::Engine("device busy".to_string()));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.log.lock().unwrap().stops += 1;
        Ok(())
    }

    async fn permission(&self) -> MicPermission {
        self.permission
    }

    async fn request_permission(&mut self) -> MicPermission {
        self.log.lock().unwrap().permission_requests += 1;
        self.grant_on_request
    }
}

/// Action handler that records every callback as `"name:arg"`
#[derive(Clone, Default)]
pub struct RecordingActions {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl RecordingActions {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(Error::Action("host unavailable".to_string()));
        }
        Ok(())
    }
}

impl ActionHandler for RecordingActions {
    fn on_camera_action(&mut self, action: &str) -> Result<()> {
        self.record(format!("camera:{action}"))
    }

    fn on_navigation_action(&mut self, action: &str) -> Result<()> {
        self.record(format!("navigation:{action}"))
    }

    fn on_emergency_action(&mut self, action: &str) -> Result<()> {
        self.record(format!("emergency:{action}"))
    }

    fn on_settings_change(&mut self, setting: &str, value: &str) -> Result<()> {
        self.record(format!("setting:{setting}={value}"))
    }

    fn on_mode_change(&mut self, mode: AppMode) -> Result<()> {
        self.record(format!("mode:{mode}"))
    }
}

/// Speech sink that records every utterance
#[derive(Clone, Default)]
pub struct RecordingSpeech {
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeech {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl SpeechSink for RecordingSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn cancel(&mut self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

pub type TestSession = RecognitionSession<FakeEngine, RecordingActions, RecordingSpeech>;

/// Handles kept by the test after the doubles move into the session
pub struct Harness {
    pub session: TestSession,
    pub engine: FakeEngine,
    pub actions: RecordingActions,
    pub speech: RecordingSpeech,
}

/// Session with default configuration and recording doubles
pub fn harness() -> Harness {
    harness_with(FakeEngine::default(), RecordingActions::default())
}

pub fn harness_with(engine: FakeEngine, actions: RecordingActions) -> Harness {
    let config = Config::default();
    let speech = RecordingSpeech::default();
    let dispatcher = DispatchController::new(&config, actions.clone(), speech.clone());
    let session = RecognitionSession::new(engine.clone(), dispatcher, &config.recognition);
    Harness {
        session,
        engine,
        actions,
        speech,
    }
}
