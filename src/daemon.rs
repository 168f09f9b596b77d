//! Daemon - the always-listening voice loop
//!
//! Owns the recognition session and drives it from a single task: engine
//! events, timer deadlines and the shutdown signal are multiplexed with
//! `tokio::select!`, so the session never needs a lock.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::voice::{
    ActionHandler, DispatchController, EngineEvent, RecognitionEngine, RecognitionSession,
    SpeechSink,
};
use crate::{Config, Error, Result};

/// The voice daemon
#[derive(Debug)]
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run until shutdown, end of the event stream, or a terminal error
    ///
    /// The engine is stopped on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` or `SessionHalted` when recognition
    /// cannot continue
    #[allow(clippy::future_not_send)]
    pub async fn run<E, A, S>(
        &self,
        engine: E,
        mut events: mpsc::Receiver<EngineEvent>,
        actions: A,
        sink: S,
    ) -> Result<()>
    where
        E: RecognitionEngine,
        A: ActionHandler,
        S: SpeechSink,
    {
        let dispatcher = DispatchController::new(&self.config, actions, sink);
        let mut session = RecognitionSession::new(engine, dispatcher, &self.config.recognition);

        // Set up shutdown signal; the watcher is aborted when `run` returns
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let _watcher = CtrlCWatcher::spawn(shutdown_tx);

        tracing::info!(
            session = %session.id(),
            wake_phrase = %self.config.wake_word.phrase,
            "starting voice daemon"
        );

        let result = Self::drive(&mut session, &mut events, &mut shutdown_rx).await;
        session.shutdown().await;
        result
    }

    #[allow(clippy::future_not_send)]
    async fn drive<E, A, S>(
        session: &mut RecognitionSession<E, A, S>,
        events: &mut mpsc::Receiver<EngineEvent>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> Result<()>
    where
        E: RecognitionEngine,
        A: ActionHandler,
        S: SpeechSink,
    {
        session.start().await?;

        loop {
            let deadline = session.next_deadline();
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("engine event stream closed");
                        return Ok(());
                    };
                    if let Err(e) = session.handle_event(event) {
                        return Err(terminal(e));
                    }
                }
                () = wait_until(deadline) => {
                    if let Err(e) = session.fire_due_timers().await {
                        return Err(terminal(e));
                    }
                }
            }
        }
    }
}

/// Forwards ctrl-c to the shutdown channel until dropped
struct CtrlCWatcher {
    task: JoinHandle<()>,
}

impl CtrlCWatcher {
    fn spawn(shutdown_tx: mpsc::Sender<()>) -> Self {
        let task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });
        Self { task }
    }
}

impl Drop for CtrlCWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn terminal(e: Error) -> Error {
    tracing::error!(error = %e, "voice recognition halted");
    e
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
