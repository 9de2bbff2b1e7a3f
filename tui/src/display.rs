//! Display State
//!
//! What the surface renders, derived from controller [`SessionUpdate`]s.
//! The surface has no business logic: it applies updates to this state and
//! rebuilds the view from it.

use shellway_core::SessionUpdate;

/// Who a displayed message belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// User input
    User,
    /// Assistant reply
    Assistant,
}

impl DisplayRole {
    /// Header text for this role
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            DisplayRole::User => "You",
            DisplayRole::Assistant => "Assistant",
        }
    }
}

/// One conversation message as displayed
#[derive(Clone, Debug)]
pub struct DisplayMessage {
    /// Who sent it
    pub role: DisplayRole,
    /// Full message text; for a streaming assistant message this is the
    /// entire accumulated reply so far
    pub content: String,
    /// Still receiving deltas?
    pub streaming: bool,
}

/// Everything the surface needs to draw a frame
#[derive(Debug, Default)]
pub struct DisplayState {
    /// Conversation messages, oldest first
    pub messages: Vec<DisplayMessage>,
    /// Is a session in flight (send control shows the stop affordance)?
    pub busy: bool,
    /// Conversation the next turn belongs to, once known
    pub conversation_id: Option<String>,
    /// Transient status-bar note (upload result, interruption, failure)
    pub status_note: Option<String>,
}

impl DisplayState {
    /// Create empty display state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one controller update
    pub fn apply_update(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::UserMessage { content } => {
                self.status_note = None;
                self.busy = true;
                self.messages.push(DisplayMessage {
                    role: DisplayRole::User,
                    content,
                    streaming: false,
                });
            }
            SessionUpdate::AssistantStarted => {
                self.messages.push(DisplayMessage {
                    role: DisplayRole::Assistant,
                    content: String::new(),
                    streaming: true,
                });
            }
            SessionUpdate::AssistantDelta { content } => {
                if let Some(msg) = self.streaming_message_mut() {
                    msg.content = content;
                }
            }
            SessionUpdate::UploadProgress { done, total } => {
                self.status_note = Some(format!("uploaded {done}/{total} attachments"));
            }
            SessionUpdate::ConversationAssigned { id } => {
                self.conversation_id = Some(id);
            }
            SessionUpdate::Completed { conversation_id } => {
                if let Some(id) = conversation_id {
                    self.conversation_id = Some(id);
                }
                self.finish_streaming();
            }
            SessionUpdate::Interrupted => {
                self.status_note = Some("reply interrupted".to_string());
                self.finish_streaming();
            }
            SessionUpdate::Failed { .. } => {
                // Error detail goes to the diagnostic log, not the view;
                // whatever was rendered stays.
                self.status_note = Some("request failed - partial reply kept".to_string());
                self.finish_streaming();
            }
        }
    }

    /// The assistant message currently receiving deltas, if any
    fn streaming_message_mut(&mut self) -> Option<&mut DisplayMessage> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.streaming && m.role == DisplayRole::Assistant)
    }

    fn finish_streaming(&mut self) {
        self.busy = false;
        if let Some(msg) = self.streaming_message_mut() {
            msg.streaming = false;
        }
    }
}
