//! Fixed-size frame headers and their wire codec.
//!
//! Every frame on the wire is a 48-byte ASCII header followed by exactly
//! `payload_length` bytes of chunk data. The header names the payload type,
//! the logical stream the chunk belongs to, and whether the chunk completes
//! that stream. This module holds the header model, the protocol constants,
//! and the codec that reads and writes the fixed byte layout.

pub mod codec;
pub mod header;

pub use codec::{HeaderError, deserialize, serialize};
pub use header::{HEADER_LENGTH, Header, MAX_PAYLOAD_LENGTH, MAX_STREAM_LENGTH, PayloadType};

#[cfg(test)]
mod tests;
