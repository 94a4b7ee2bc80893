//! PostgreSQL wire protocol: framing and decoding.
//!
//! - `codec`: byte-order read helpers (component A)
//! - `message`: the decoded `Message` record and tag constants
//! - `decode`: per-tag dispatcher and FIFO pairing (component B)

pub mod codec;
pub mod decode;
pub mod message;

pub use decode::{DecodeOutcome, decode_message};
pub use message::Message;
