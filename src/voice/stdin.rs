//! Line-driven recognition engine for the terminal
//!
//! Each line typed on stdin is delivered as a final transcript. Lines that
//! start with `!` simulate engine events instead, which makes the restart
//! and backoff behaviour easy to exercise by hand:
//!
//! - `!end` ends the engine session
//! - `!<error-name>` reports an error, e.g. `!network` or `!no-speech`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::engine::{EngineErrorKind, EngineEvent, MicPermission, RecognitionEngine, TranscriptionResult};
use crate::Result;

/// Confidence attached to typed transcripts
pub const TYPED_CONFIDENCE: f32 = 0.9;

const EVENT_BUFFER: usize = 64;

/// Engine that reads transcripts from stdin
///
/// The event channel closes when stdin reaches end of file.
pub struct StdinEngine {
    sender: Option<mpsc::Sender<EngineEvent>>,
    weak: mpsc::WeakSender<EngineEvent>,
    listening: Arc<AtomicBool>,
}

impl StdinEngine {
    /// Create the engine and the receiving end of its event stream
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let engine = Self {
            weak: tx.downgrade(),
            sender: Some(tx),
            listening: Arc::new(AtomicBool::new(false)),
        };
        (engine, rx)
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = self.weak.upgrade()
            && let Err(e) = tx.try_send(event)
        {
            tracing::warn!(error = %e, "engine event dropped");
        }
    }

    fn spawn_reader(&mut self) {
        let Some(tx) = self.sender.take() else {
            return;
        };
        let listening = Arc::clone(&self.listening);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if !listening.load(Ordering::SeqCst) {
                    tracing::debug!(line, "not listening, input dropped");
                    continue;
                }

                let event = parse_line(line);
                if matches!(event, EngineEvent::Ended | EngineEvent::Error(_)) {
                    listening.store(false, Ordering::SeqCst);
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
    }
}

/// Translate one input line into an engine event
#[must_use]
pub fn parse_line(line: &str) -> EngineEvent {
    match line.strip_prefix('!') {
        Some("end") => EngineEvent::Ended,
        Some(name) => {
            let kind = name.parse::<EngineErrorKind>().unwrap_or(EngineErrorKind::Unknown);
            EngineEvent::Error(kind)
        }
        None => EngineEvent::Result(TranscriptionResult::final_text(line, TYPED_CONFIDENCE)),
    }
}

#[async_trait]
impl RecognitionEngine for StdinEngine {
    fn name(&self) -> &'static str {
        "stdin"
    }

    async fn start(&mut self) -> Result<()> {
        self.spawn_reader();
        self.listening.store(true, Ordering::SeqCst);
        self.emit(EngineEvent::Started);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.listening.swap(false, Ordering::SeqCst) {
            self.emit(EngineEvent::Ended);
        }
        Ok(())
    }

    async fn permission(&self) -> MicPermission {
        MicPermission::Granted
    }

    async fn request_permission(&mut self) -> MicPermission {
        MicPermission::Granted
    }
}
