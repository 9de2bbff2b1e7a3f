//! Shellway Core - Headless Streaming Chat Client
//!
//! This crate contains everything needed to talk to the shellway chat
//! server and reconstruct its streamed replies, completely independent of
//! any UI framework. It can drive a TUI, a GUI, or run headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Surface (TUI)                      │
//! │        submit / interrupt            SessionUpdate        │
//! └─────────────┬─────────────────────────────▲───────────────┘
//!               │                             │
//! ┌─────────────▼─────────────────────────────┴───────────────┐
//! │                      ChatController                       │
//! │   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐   │
//! │   │ StreamSession│   │ ChatTransport│   │  protocol   │   │
//! │   │ (state +     │   │ (reqwest or  │   │ Frame + Evt │   │
//! │   │  buffer)     │   │  mock)       │   │ decoding    │   │
//! │   └──────────────┘   └──────────────┘   └─────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The reply text accumulated by a session is partitioned by [`segment`]
//! into typed content segments (prose, command invocations, verbatim
//! output) which the surface renders; segmentation is re-derived from the
//! full text after every delta, never patched incrementally.
//!
//! # Module Overview
//!
//! - [`protocol`]: frame reassembly and stream event interpretation
//! - [`segment`]: partitioning accumulated reply text into typed segments
//! - [`session`]: one user turn's lifecycle state and surface updates
//! - [`controller`]: orchestration of submit/stream/interrupt
//! - [`api`]: the transport seam and its reqwest implementation
//! - [`config`]: environment-driven client configuration
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod controller;
pub mod protocol;
pub mod segment;
pub mod session;

// Re-exports for convenience
pub use api::{
    ChatRequest, ChatTransport, ClientError, HttpApiClient, SettingsUpdate, SettingsView,
    StreamSignal,
};
pub use config::ClientConfig;
pub use controller::ChatController;
pub use protocol::{interpret, FrameDecoder, StreamEvent};
pub use segment::{segment_text, ContentSegment, COMMAND_PREFIX, OUTPUT_BEGIN, OUTPUT_END};
pub use session::{SessionState, SessionUpdate, StreamSession};
