//! Serialization of frame headers to and from the fixed 48-byte layout.
//!
//! The layout is ASCII throughout, with delimiters at fixed offsets:
//!
//! ```text
//! offset  0     1  2-7        8  9-44      45  46   47
//! field   type  .  length(6)  .  uuid(36)  .   end  \n
//! ```
//!
//! The length field is zero-padded decimal; the id is the canonical
//! 36-character hyphenated UUID form; the end flag is `'1'` or `'0'`. A
//! buffer that deviates from this layout at any offset fails to decode with
//! a [`HeaderError`] naming the offending field. The layout is load-bearing
//! for wire compatibility and must not drift.

use std::fmt;

use uuid::Uuid;

use super::header::{HEADER_LENGTH, Header, MAX_STREAM_LENGTH, PayloadType};

const DELIMITER: u8 = b'.';
const TERMINATOR: u8 = b'\n';
const END: u8 = b'1';
const NOT_END: u8 = b'0';

const TYPE_OFFSET: usize = 0;
const TYPE_DELIMITER_OFFSET: usize = 1;
const LENGTH_OFFSET: usize = 2;
const LENGTH_LENGTH: usize = 6;
const LENGTH_DELIMITER_OFFSET: usize = 8;
const ID_OFFSET: usize = 9;
const ID_LENGTH: usize = 36;
const ID_DELIMITER_OFFSET: usize = 45;
const END_OFFSET: usize = 46;
const TERMINATOR_OFFSET: usize = 47;

/// Reasons a frame header failed to serialize or deserialize.
///
/// Each malformed field is reported distinctly so protocol violations can
/// be diagnosed without inspecting raw bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderError {
    /// The buffer length did not equal [`HEADER_LENGTH`].
    BufferLength {
        /// Observed buffer length in bytes.
        actual: usize,
    },
    /// The type tag byte did not name a known payload type.
    UnknownType(u8),
    /// A delimiter position held a byte other than `'.'`.
    Delimiter {
        /// Offset of the malformed delimiter.
        offset: usize,
        /// Byte found at that offset.
        actual: u8,
    },
    /// The length field held a non-digit byte.
    PayloadLength,
    /// A payload length exceeded the six-digit maximum on serialize.
    PayloadLengthRange {
        /// Requested payload length.
        actual: usize,
    },
    /// The id field did not parse as a hyphenated UUID.
    StreamId,
    /// The end flag byte was neither `'1'` nor `'0'`.
    EndFlag(u8),
    /// The final byte was not the `'\n'` terminator.
    Terminator(u8),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferLength { actual } => {
                write!(f, "header buffer is {actual} bytes, expected {HEADER_LENGTH}")
            }
            Self::UnknownType(tag) => write!(f, "unknown payload type tag {tag:#04x}"),
            Self::Delimiter { offset, actual } => {
                write!(f, "malformed delimiter {actual:#04x} at offset {offset}")
            }
            Self::PayloadLength => f.write_str("payload length field is not a decimal number"),
            Self::PayloadLengthRange { actual } => {
                write!(f, "payload length {actual} exceeds {MAX_STREAM_LENGTH}")
            }
            Self::StreamId => f.write_str("stream id field is not a valid uuid"),
            Self::EndFlag(byte) => write!(f, "malformed end flag byte {byte:#04x}"),
            Self::Terminator(byte) => write!(f, "malformed terminator byte {byte:#04x}"),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Serialize a header into its 48-byte wire form.
///
/// # Errors
///
/// Returns [`HeaderError::PayloadLengthRange`] when the payload length does
/// not fit the six-digit decimal field.
pub fn serialize(header: &Header) -> Result<[u8; HEADER_LENGTH], HeaderError> {
    if header.payload_length > MAX_STREAM_LENGTH {
        return Err(HeaderError::PayloadLengthRange {
            actual: header.payload_length,
        });
    }

    let mut buffer = [0_u8; HEADER_LENGTH];
    buffer[TYPE_OFFSET] = header.payload_type.tag();
    buffer[TYPE_DELIMITER_OFFSET] = DELIMITER;

    let mut remaining = header.payload_length;
    for slot in buffer[LENGTH_OFFSET..LENGTH_OFFSET + LENGTH_LENGTH]
        .iter_mut()
        .rev()
    {
        *slot = b'0' + u8::try_from(remaining % 10).expect("digit fits u8");
        remaining /= 10;
    }
    buffer[LENGTH_DELIMITER_OFFSET] = DELIMITER;

    let mut id_buffer = [0_u8; ID_LENGTH];
    header.id.hyphenated().encode_lower(&mut id_buffer);
    buffer[ID_OFFSET..ID_OFFSET + ID_LENGTH].copy_from_slice(&id_buffer);
    buffer[ID_DELIMITER_OFFSET] = DELIMITER;

    buffer[END_OFFSET] = if header.end { END } else { NOT_END };
    buffer[TERMINATOR_OFFSET] = TERMINATOR;

    Ok(buffer)
}

/// Deserialize a header from its 48-byte wire form.
///
/// # Errors
///
/// Returns a [`HeaderError`] naming the first malformed field: wrong buffer
/// length, unknown type tag, a misplaced delimiter or terminator, a
/// non-decimal length field, an unparsable id, or an invalid end flag.
pub fn deserialize(buffer: &[u8]) -> Result<Header, HeaderError> {
    if buffer.len() != HEADER_LENGTH {
        return Err(HeaderError::BufferLength {
            actual: buffer.len(),
        });
    }

    let payload_type = PayloadType::from_tag(buffer[TYPE_OFFSET])
        .ok_or(HeaderError::UnknownType(buffer[TYPE_OFFSET]))?;
    check_delimiter(buffer, TYPE_DELIMITER_OFFSET)?;

    let payload_length = parse_length(&buffer[LENGTH_OFFSET..LENGTH_OFFSET + LENGTH_LENGTH])?;
    check_delimiter(buffer, LENGTH_DELIMITER_OFFSET)?;

    let id = Uuid::try_parse_ascii(&buffer[ID_OFFSET..ID_OFFSET + ID_LENGTH])
        .map_err(|_| HeaderError::StreamId)?;
    check_delimiter(buffer, ID_DELIMITER_OFFSET)?;

    let end = match buffer[END_OFFSET] {
        END => true,
        NOT_END => false,
        other => return Err(HeaderError::EndFlag(other)),
    };

    if buffer[TERMINATOR_OFFSET] != TERMINATOR {
        return Err(HeaderError::Terminator(buffer[TERMINATOR_OFFSET]));
    }

    Ok(Header {
        payload_type,
        payload_length,
        id,
        end,
    })
}

fn check_delimiter(buffer: &[u8], offset: usize) -> Result<(), HeaderError> {
    if buffer[offset] == DELIMITER {
        Ok(())
    } else {
        Err(HeaderError::Delimiter {
            offset,
            actual: buffer[offset],
        })
    }
}

fn parse_length(field: &[u8]) -> Result<usize, HeaderError> {
    field.iter().try_fold(0_usize, |total, byte| {
        if byte.is_ascii_digit() {
            Ok(total * 10 + usize::from(byte - b'0'))
        } else {
            Err(HeaderError::PayloadLength)
        }
    })
}
