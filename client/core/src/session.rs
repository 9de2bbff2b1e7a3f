//! Stream Session Management
//!
//! One session covers the lifecycle of a single user turn: from submission,
//! through an optional attachment upload and the streaming read, to a
//! terminal state. The session owns the accumulated reply buffer - append
//! only while the stream lives - and the conversation identifier the server
//! may assign mid-stream.
//!
//! # Design Philosophy
//!
//! The session is plain state; the [`controller`](crate::controller) drives
//! it and the surface renders from the [`SessionUpdate`]s it emits. Exactly
//! one session may be live per input surface at a time - a new submission
//! while one is in flight is rejected until the live one reaches a terminal
//! state.

use uuid::Uuid;

/// Lifecycle states of a stream session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing sent yet
    Idle,
    /// Uploading staged attachments (strictly precedes the stream request)
    Uploading,
    /// Outbound streaming request issued, response not yet arriving
    Sending,
    /// Reading the response stream; the dominant steady state
    Streaming,
    /// Stream ended normally
    Completed,
    /// User interrupted; the server was told to stop
    Interrupted,
    /// The request or the stream read failed
    Failed,
}

impl SessionState {
    /// Terminal states allow a new submission to start
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Interrupted | Self::Failed)
    }
}

/// The lifecycle of one user turn, from submission to terminal state
#[derive(Clone, Debug)]
pub struct StreamSession {
    /// Unique token identifying this request to the server (interrupts
    /// reference it)
    pub request_id: String,
    /// Conversation identifier, discovered mid-stream on a first turn
    pub conversation_id: Option<String>,
    /// The assistant reply accumulated so far
    accumulated: String,
    state: SessionState,
}

impl StreamSession {
    /// Create a fresh session with a unique request identifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            conversation_id: None,
            accumulated: String::new(),
            state: SessionState::Idle,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The full reply text accumulated so far
    #[must_use]
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Append a text delta to the accumulated reply
    ///
    /// Ignored once the session is terminal - a late delta from a detached
    /// stream must not mutate a finished message.
    pub fn append_delta(&mut self, text: &str) {
        if !self.state.is_terminal() {
            self.accumulated.push_str(text);
        }
    }

    /// Record the conversation identifier assigned by the server
    pub fn assign_conversation(&mut self, id: String) {
        self.conversation_id = Some(id);
    }

    /// Advance the lifecycle state
    ///
    /// Terminal states are sticky: an `End` arriving after an interrupt
    /// leaves the session `Interrupted`.
    pub fn transition(&mut self, next: SessionState) {
        if self.state.is_terminal() {
            tracing::debug!(
                from = ?self.state,
                to = ?next,
                request_id = %self.request_id,
                "ignoring transition out of terminal state"
            );
            return;
        }
        self.state = next;
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages from the controller to the rendering surface
///
/// The surface has no business logic: it applies these to its display state
/// and re-renders. `AssistantDelta` carries the *entire* accumulated text,
/// not the increment - the surface re-segments and rebuilds the message view
/// from scratch on every update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The user's message was accepted; display it
    UserMessage {
        /// The submitted text
        content: String,
    },
    /// A placeholder assistant message should appear (empty, streaming)
    AssistantStarted,
    /// The accumulated assistant reply changed; re-render it in full
    AssistantDelta {
        /// Full accumulated reply text
        content: String,
    },
    /// Staged attachments finished uploading
    UploadProgress {
        /// Files uploaded so far
        done: usize,
        /// Files staged in total
        total: usize,
    },
    /// The server assigned a conversation identifier
    ConversationAssigned {
        /// Server-side conversation identifier
        id: String,
    },
    /// The stream ended normally
    Completed {
        /// Conversation to scope subsequent turns to, if one was assigned
        conversation_id: Option<String>,
    },
    /// The session was interrupted by the user
    Interrupted,
    /// The request or stream read failed; partial content stays rendered
    Failed {
        /// Operator-facing error description
        error: String,
    },
}
