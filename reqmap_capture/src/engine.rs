//! Capture engine task and the handle UI surfaces talk to
//!
//! The engine owns the session state and the record store and runs as a
//! single task, so event handling and command handling never race. The
//! handle wraps the command channel in one async method per command.

use crate::session::CaptureSession;
use crate::store::RecordStore;
use reqmap_common::{
    AckStatus, CaptureStatus, Command, CommandResponse, LifecycleEvent, RequestRecord, TabId,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors surfaced to callers of [`CaptureHandle`]
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture engine is no longer running")]
    ChannelClosed,

    #[error("Unexpected response to {0} command")]
    UnexpectedResponse(&'static str),
}

type CommandEnvelope = (Command, oneshot::Sender<CommandResponse>);

struct CaptureEngine {
    session: CaptureSession,
    store: RecordStore,
}

impl CaptureEngine {
    fn new() -> Self {
        Self {
            session: CaptureSession::new(),
            store: RecordStore::new(),
        }
    }

    /// Record a lifecycle event if the active session accepts its tab.
    /// Everything else is silently dropped.
    async fn handle_event(&self, event: LifecycleEvent) {
        if !self.session.accepts(event.tab_id()) {
            return;
        }
        match event {
            LifecycleEvent::Started(e) => self.store.apply_started(e).await,
            LifecycleEvent::Completed(e) => self.store.apply_completed(e).await,
        }
    }

    async fn handle_command(&mut self, command: Command) -> CommandResponse {
        match command {
            Command::StartCapture { tab_id } => {
                // Prior session data is lost; there is no archival.
                self.store.clear().await;
                self.session.start(tab_id);
                info!(tab_id, "Capture started");
                CommandResponse::Ack {
                    status: AckStatus::Started,
                }
            }
            Command::StopCapture => {
                self.session.stop();
                info!("Capture stopped");
                CommandResponse::Ack {
                    status: AckStatus::Stopped,
                }
            }
            Command::GetStatus => CommandResponse::Status(self.session.status()),
            Command::GetRequests => CommandResponse::Requests {
                requests: self.store.snapshot().await,
            },
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<LifecycleEvent>,
        mut commands: mpsc::Receiver<CommandEnvelope>,
    ) {
        loop {
            // Biased toward the event arm: pending events are always
            // recorded before the next command is served, so a snapshot
            // taken right after a burst of events sees all of them.
            tokio::select! {
                biased;

                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        // Event source gone; keep serving commands so
                        // collected records stay queryable.
                        None => break,
                    }
                }
                envelope = commands.recv() => {
                    let Some((command, reply)) = envelope else {
                        debug!("All capture handles dropped, engine exiting");
                        return;
                    };
                    let response = self.handle_command(command).await;
                    let _ = reply.send(response);
                }
            }
        }

        // Drain remaining commands after the event stream ends
        while let Some((command, reply)) = commands.recv().await {
            let response = self.handle_command(command).await;
            let _ = reply.send(response);
        }
    }
}

/// Messaging façade over the engine's command channel. Clonable; every
/// method suspends until the engine replies.
#[derive(Clone)]
pub struct CaptureHandle {
    commands: mpsc::Sender<CommandEnvelope>,
}

impl CaptureHandle {
    async fn send(&self, command: Command) -> Result<CommandResponse, CaptureError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send((command, reply_tx))
            .await
            .map_err(|_| CaptureError::ChannelClosed)?;
        reply_rx.await.map_err(|_| CaptureError::ChannelClosed)
    }

    /// Start a capture session for `tab_id`, clearing prior records.
    pub async fn start_capture(&self, tab_id: TabId) -> Result<(), CaptureError> {
        match self.send(Command::StartCapture { tab_id }).await? {
            CommandResponse::Ack {
                status: AckStatus::Started,
            } => Ok(()),
            _ => Err(CaptureError::UnexpectedResponse("startCapture")),
        }
    }

    /// Stop the capture session. Collected records remain queryable.
    pub async fn stop_capture(&self) -> Result<(), CaptureError> {
        match self.send(Command::StopCapture).await? {
            CommandResponse::Ack {
                status: AckStatus::Stopped,
            } => Ok(()),
            _ => Err(CaptureError::UnexpectedResponse("stopCapture")),
        }
    }

    pub async fn status(&self) -> Result<CaptureStatus, CaptureError> {
        match self.send(Command::GetStatus).await? {
            CommandResponse::Status(status) => Ok(status),
            _ => Err(CaptureError::UnexpectedResponse("getStatus")),
        }
    }

    /// Snapshot of all captured records
    pub async fn requests(&self) -> Result<Vec<RequestRecord>, CaptureError> {
        match self.send(Command::GetRequests).await? {
            CommandResponse::Requests { requests } => Ok(requests),
            _ => Err(CaptureError::UnexpectedResponse("getRequests")),
        }
    }
}

/// Spawn the capture engine, wired to the given lifecycle event stream.
pub fn spawn_engine(events: mpsc::Receiver<LifecycleEvent>) -> (CaptureHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(64);
    let engine = CaptureEngine::new();
    let task = tokio::spawn(engine.run(events, command_rx));
    (CaptureHandle { commands: command_tx }, task)
}
