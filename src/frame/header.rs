//! Header model for protocol frames.
//!
//! A [`Header`] describes one chunk of payload bytes: what kind of payload
//! it carries, which logical stream it belongs to, how many bytes follow,
//! and whether the stream is complete after this chunk.

use std::fmt;

use uuid::Uuid;

/// Serialized size of a frame header in bytes.
pub const HEADER_LENGTH: usize = 48;

/// Largest chunk of payload bytes a single frame may carry.
pub const MAX_PAYLOAD_LENGTH: usize = 4096;

/// Upper bound of the six-digit decimal length field.
pub const MAX_STREAM_LENGTH: usize = 999_999;

/// Kind of payload a frame carries.
///
/// The variant set is closed: a frame whose type tag is not one of these
/// five bytes is rejected at decode time, so downstream dispatch can match
/// exhaustively.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PayloadType {
    /// A chunk of a JSON-encoded request control payload.
    Request,
    /// A chunk of a JSON-encoded response control payload.
    Response,
    /// A chunk of raw content bytes for an announced stream.
    Stream,
    /// Cancel every stream associated with the sender.
    CancelAll,
    /// Cancel the single stream named by the header id.
    CancelStream,
}

impl PayloadType {
    /// Wire tag byte for this payload type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Request => b'A',
            Self::Response => b'B',
            Self::Stream => b'S',
            Self::CancelAll => b'X',
            Self::CancelStream => b'C',
        }
    }

    /// Resolve a wire tag byte, if it names a known payload type.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'A' => Some(Self::Request),
            b'B' => Some(Self::Response),
            b'S' => Some(Self::Stream),
            b'X' => Some(Self::CancelAll),
            b'C' => Some(Self::CancelStream),
            _ => None,
        }
    }

    /// Report whether frames of this type carry raw content-stream bytes.
    #[must_use]
    pub const fn is_stream(self) -> bool { matches!(self, Self::Stream) }

    /// Report whether frames of this type cancel streams rather than carry
    /// payload.
    #[must_use]
    pub const fn is_cancellation(self) -> bool {
        matches!(self, Self::CancelAll | Self::CancelStream)
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.tag()))
    }
}

/// Per-frame metadata preceding each chunk of payload bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    /// Kind of payload the following chunk belongs to.
    pub payload_type: PayloadType,
    /// Exact byte count of the chunk that follows this header.
    pub payload_length: usize,
    /// Identifier of the logical stream this chunk belongs to.
    pub id: Uuid,
    /// True iff this frame is the last chunk of its logical stream.
    pub end: bool,
}

impl Header {
    /// Create a header for one payload chunk.
    #[must_use]
    pub const fn new(payload_type: PayloadType, payload_length: usize, id: Uuid, end: bool) -> Self {
        Self {
            payload_type,
            payload_length,
            id,
            end,
        }
    }

    /// Create a payload-less cancellation header.
    #[must_use]
    pub const fn cancellation(payload_type: PayloadType, id: Uuid) -> Self {
        Self::new(payload_type, 0, id, true)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}.{}.{}",
            self.payload_type,
            self.payload_length,
            self.id,
            u8::from(self.end)
        )
    }
}
