//! Stream Event Interpretation
//!
//! Turns one framed record payload into a logical stream event. The server
//! tags every meaningful record with a `data:` prefix; anything else (keep-
//! alive or comment frames) is dropped without an event. The payload after
//! the tag is usually a JSON-encoded string - the server encodes chunks so
//! embedded newlines or nested `data:` text cannot be misparsed - but bare
//! strings occur too, so decoding falls back to the raw text.
//!
//! Two payload values are sentinels rather than display text: `[DONE]`
//! terminates the stream, and a `[CONV_ID]` prefix assigns the conversation
//! identifier created for a first turn. Everything else is a text delta.

/// Record prefix identifying a frame that carries stream data
pub const DATA_PREFIX: &str = "data:";

/// Sentinel payload marking the end of the stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Sentinel prefix carrying a newly assigned conversation identifier
pub const CONV_ID_PREFIX: &str = "[CONV_ID]";

/// A logical event reconstructed from the response stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk of assistant text to append to the accumulated reply
    TextDelta(String),
    /// The server assigned a conversation identifier for this exchange
    ConversationAssigned(String),
    /// End of the reply; no further frames are meaningful
    End,
}

/// Interpret one frame payload, if it carries stream data
///
/// Returns `None` for frames without the `data:` prefix. Pure function:
/// no state, no side effects.
#[must_use]
pub fn interpret(frame: &str) -> Option<StreamEvent> {
    let rest = frame.strip_prefix(DATA_PREFIX)?;
    let trimmed = rest.trim();

    // Payloads are normally JSON string literals; fall back to the raw
    // trimmed text when they are not.
    let payload = match serde_json::from_str::<String>(trimmed) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::trace!(error = %err, "payload is not a JSON string, using raw text");
            trimmed.to_string()
        }
    };

    if payload == DONE_SENTINEL {
        return Some(StreamEvent::End);
    }
    if let Some(id) = payload.strip_prefix(CONV_ID_PREFIX) {
        return Some(StreamEvent::ConversationAssigned(id.to_string()));
    }
    Some(StreamEvent::TextDelta(unescape_line_breaks(&payload)))
}

/// Replace literal `\n` / `\r` escape pairs with real control characters
fn unescape_line_breaks(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\r", "\r")
}
