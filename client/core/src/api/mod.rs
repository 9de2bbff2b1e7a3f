//! Chat Server API
//!
//! The [`ChatTransport`] trait is the seam between the session controller
//! and the network: the controller only ever talks to the trait, so tests
//! drive it with a scripted mock while the binary wires in the reqwest
//! implementation from [`http`].

pub mod http;
pub mod traits;

use thiserror::Error;

pub use http::HttpApiClient;
pub use traits::{
    ChatRequest, ChatTransport, SettingsUpdate, SettingsView, StreamSignal,
};

/// Errors from talking to the chat server
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request itself failed (connect, TLS, etc.)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: reqwest::StatusCode,
        /// Response body, best effort
        body: String,
    },

    /// Reading a staged attachment from disk failed
    #[error("cannot read attachment {path}: {source}")]
    Attachment {
        /// The path that could not be read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
