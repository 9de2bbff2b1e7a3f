//! Wire Protocol
//!
//! Decoding of the server's streamed reply: the [`frame`] module reassembles
//! blank-line-delimited records from arbitrarily chunked bytes, and the
//! [`event`] module interprets each record as a logical [`StreamEvent`].
//!
//! Both layers are pure with respect to I/O - they are fed by whoever owns
//! the response body and can be driven byte-by-byte in tests.

pub mod event;
pub mod frame;

pub use event::{interpret, StreamEvent, CONV_ID_PREFIX, DATA_PREFIX, DONE_SENTINEL};
pub use frame::FrameDecoder;
