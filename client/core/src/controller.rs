//! Stream Session Controller
//!
//! Orchestrates one request lifecycle end to end: accepts a submission,
//! uploads staged attachments, issues the streaming request, drains the
//! decoded event stream, and emits [`SessionUpdate`]s for the surface to
//! render. The surface calls [`ChatController::poll_streaming`] from its own
//! event loop, so every update is applied - and every re-render completes -
//! before the next event is processed. Nothing re-enters this pipeline
//! concurrently.
//!
//! Only one session may be in flight at a time; a submission while one is
//! live is rejected as a no-op until the live session reaches a terminal
//! state.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::api::{ChatRequest, ChatTransport, ClientError, SettingsUpdate, SettingsView, StreamSignal};
use crate::protocol::StreamEvent;
use crate::session::{SessionState, SessionUpdate, StreamSession};

/// Drives stream sessions against a [`ChatTransport`]
pub struct ChatController<T: ChatTransport> {
    transport: T,
    updates: mpsc::Sender<SessionUpdate>,
    session: Option<StreamSession>,
    signals: Option<mpsc::Receiver<StreamSignal>>,
    staged: Vec<PathBuf>,
    conversation_id: Option<String>,
}

impl<T: ChatTransport> ChatController<T> {
    /// Create a controller that emits updates over `updates`
    pub fn new(transport: T, updates: mpsc::Sender<SessionUpdate>) -> Self {
        Self {
            transport,
            updates,
            session: None,
            signals: None,
            staged: Vec::new(),
            conversation_id: None,
        }
    }

    /// Is a session currently in flight?
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.state().is_terminal())
    }

    /// Conversation the next turn will be appended to, if known
    #[must_use]
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Forget the current conversation; the next turn starts a new one
    pub fn start_new_conversation(&mut self) {
        self.conversation_id = None;
    }

    /// Stage a file to upload with the next submission
    pub fn stage_attachment(&mut self, path: PathBuf) {
        self.staged.push(path);
    }

    /// Number of files staged for the next submission
    #[must_use]
    pub fn staged_attachments(&self) -> usize {
        self.staged.len()
    }

    /// Drop all staged files
    pub fn clear_attachments(&mut self) {
        self.staged.clear();
    }

    /// Submit a user turn
    ///
    /// Returns `false` if the submission was rejected (empty text, or a
    /// session already in flight). Staged attachments are uploaded first;
    /// an upload failure is logged and the turn is sent without them.
    pub async fn submit(&mut self, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }
        if self.is_busy() {
            tracing::debug!("submission rejected: a session is already in flight");
            return false;
        }

        let mut session = StreamSession::new();
        let _ = self
            .updates
            .send(SessionUpdate::UserMessage {
                content: content.to_string(),
            })
            .await;
        let _ = self.updates.send(SessionUpdate::AssistantStarted).await;

        let mut files = Vec::new();
        if !self.staged.is_empty() {
            session.transition(SessionState::Uploading);
            let staged = std::mem::take(&mut self.staged);
            match self.transport.upload(&staged).await {
                Ok(refs) => {
                    let _ = self
                        .updates
                        .send(SessionUpdate::UploadProgress {
                            done: refs.len(),
                            total: staged.len(),
                        })
                        .await;
                    files = refs;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "attachment upload failed, sending without files");
                }
            }
        }

        session.transition(SessionState::Sending);
        let request = ChatRequest {
            content: content.to_string(),
            request_id: session.request_id.clone(),
            conversation_id: self.conversation_id.clone(),
            files,
        };

        match self.transport.stream_reply(request).await {
            Ok(rx) => {
                session.transition(SessionState::Streaming);
                self.signals = Some(rx);
                self.session = Some(session);
            }
            Err(err) => {
                tracing::warn!(error = %err, request_id = %session.request_id, "chat request failed");
                session.transition(SessionState::Failed);
                self.session = Some(session);
                let _ = self
                    .updates
                    .send(SessionUpdate::Failed {
                        error: err.to_string(),
                    })
                    .await;
            }
        }
        true
    }

    /// Drain pending stream signals and apply them (must be called regularly)
    ///
    /// Events are applied in arrival order; the session detaches from the
    /// stream once a terminal signal has been handled.
    pub async fn poll_streaming(&mut self) {
        let Some(mut rx) = self.signals.take() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut detached = false;
        while !detached {
            match rx.try_recv() {
                Ok(signal) => {
                    detached = apply_signal(session, &self.updates, signal).await;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    session.transition(SessionState::Failed);
                    let _ = self
                        .updates
                        .send(SessionUpdate::Failed {
                            error: "stream closed unexpectedly".to_string(),
                        })
                        .await;
                    detached = true;
                }
            }
        }

        if detached {
            if let Some(id) = session.conversation_id.clone() {
                self.conversation_id = Some(id);
            }
        } else {
            self.signals = Some(rx);
        }
    }

    /// Interrupt the in-flight session
    ///
    /// The send affordance reverts immediately: the session becomes
    /// `Interrupted` (terminal) and detaches from the stream, keeping
    /// everything already rendered. The server is asked to stop producing;
    /// its side of the stream is left to wind down on its own.
    pub async fn interrupt(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state().is_terminal() {
            return;
        }

        let request_id = session.request_id.clone();
        session.transition(SessionState::Interrupted);
        if let Some(id) = session.conversation_id.clone() {
            self.conversation_id = Some(id);
        }
        self.signals = None;
        let _ = self.updates.send(SessionUpdate::Interrupted).await;

        if let Err(err) = self.transport.interrupt(&request_id).await {
            tracing::warn!(error = %err, request_id = %request_id, "interrupt request failed");
        }
    }

    /// Read account settings from the server
    pub async fn fetch_settings(&self) -> Result<SettingsView, ClientError> {
        self.transport.fetch_settings().await
    }

    /// Write account settings to the server
    pub async fn update_settings(&self, api_key: String) -> Result<(), ClientError> {
        self.transport
            .update_settings(&SettingsUpdate { api_key })
            .await
    }

    /// Delete the current conversation server-side and forget it locally
    pub async fn delete_conversation(&mut self) -> Result<(), ClientError> {
        let Some(id) = self.conversation_id.clone() else {
            return Ok(());
        };
        self.transport.delete_conversation(&id).await?;
        self.conversation_id = None;
        Ok(())
    }
}

/// Apply one stream signal to the session, emitting surface updates
///
/// Returns `true` when the signal was terminal and the session should
/// detach from the stream.
async fn apply_signal(
    session: &mut StreamSession,
    updates: &mpsc::Sender<SessionUpdate>,
    signal: StreamSignal,
) -> bool {
    match signal {
        StreamSignal::Event(StreamEvent::TextDelta(text)) => {
            session.append_delta(&text);
            let _ = updates
                .send(SessionUpdate::AssistantDelta {
                    content: session.accumulated().to_string(),
                })
                .await;
            false
        }
        StreamSignal::Event(StreamEvent::ConversationAssigned(id)) => {
            session.assign_conversation(id.clone());
            let _ = updates
                .send(SessionUpdate::ConversationAssigned { id })
                .await;
            false
        }
        StreamSignal::Event(StreamEvent::End) => {
            session.transition(SessionState::Completed);
            let _ = updates
                .send(SessionUpdate::Completed {
                    conversation_id: session.conversation_id.clone(),
                })
                .await;
            true
        }
        StreamSignal::Failed(error) => {
            session.transition(SessionState::Failed);
            let _ = updates.send(SessionUpdate::Failed { error }).await;
            true
        }
    }
}
