//! Transport Abstraction
//!
//! What the session controller needs from the chat server, expressed as a
//! trait so the controller can be tested against a scripted implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::protocol::StreamEvent;
use super::ClientError;

/// One outbound streaming chat request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's message text
    pub content: String,
    /// Unique token identifying this request (interrupts reference it)
    pub request_id: String,
    /// Conversation to append to; `None` starts a new one server-side
    pub conversation_id: Option<String>,
    /// Server-assigned references of previously uploaded files
    pub files: Vec<String>,
}

/// What flows out of a live reply stream
///
/// Protocol events stay the closed [`StreamEvent`] type; transport-level
/// failures travel the same channel so the controller sees them in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSignal {
    /// A decoded protocol event
    Event(StreamEvent),
    /// The stream read failed; no further signals will arrive
    Failed(String),
}

/// Account settings as reported by the server
///
/// Consumed only to decide UI affordances; the credential itself is never
/// sent back down.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct SettingsView {
    /// Whether an API credential is configured server-side
    pub api_key_set: bool,
    /// Masked placeholder for display
    #[serde(default)]
    pub api_key_masked: String,
}

/// Settings fields to write back to the server
#[derive(Clone, Debug, Serialize)]
pub struct SettingsUpdate {
    /// New API credential (empty clears it)
    pub api_key: String,
}

/// The chat server, as seen by the session controller
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issue the streaming chat request
    ///
    /// Returns a receiver of [`StreamSignal`]s in strict arrival order. The
    /// implementation owns the response body and the frame decoding; it
    /// stops producing after `End` or a failure.
    async fn stream_reply(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamSignal>, ClientError>;

    /// Ask the server to stop producing output for a request
    ///
    /// Fire-and-forget: the reply stream is expected to end on its own.
    async fn interrupt(&self, request_id: &str) -> Result<(), ClientError>;

    /// Upload staged attachments, returning server-assigned references
    async fn upload(&self, files: &[PathBuf]) -> Result<Vec<String>, ClientError>;

    /// Read account settings
    async fn fetch_settings(&self) -> Result<SettingsView, ClientError>;

    /// Write account settings
    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), ClientError>;

    /// Delete a conversation and its messages
    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError>;
}
