//! Splitting payloads into wire frames.
//!
//! A control payload (the JSON announcing a request or response) and each
//! content stream are disassembled independently: the bytes are cut into
//! chunks no larger than [`MAX_PAYLOAD_LENGTH`], each prefixed with a
//! header carrying the payload's stream id, and the final chunk's header
//! flags the end of the stream. Chunks of one logical stream are enqueued
//! in order; the receiver reconstructs purely by append order per id.

use bytes::Bytes;
use uuid::Uuid;

use super::models::{RequestPayload, ResponsePayload, StreamDescription};
use crate::{
    error::Result,
    frame::{Header, MAX_PAYLOAD_LENGTH, PayloadType},
    request::{MessageStream, StreamingRequest},
    response::StreamingResponse,
    transport::PayloadSender,
};

/// Enqueue `payload` as a sequence of framed chunks under `id`.
///
/// A zero-length payload still produces one end-flagged frame so the
/// receiver observes the stream.
///
/// # Errors
///
/// Returns [`crate::WeftError::Disconnected`] when the sender's writer has
/// stopped.
pub(crate) fn send_in_chunks(
    sender: &PayloadSender,
    payload_type: PayloadType,
    id: Uuid,
    payload: &Bytes,
) -> Result<()> {
    if payload.is_empty() {
        return sender.send_payload(Header::new(payload_type, 0, id, true), Bytes::new());
    }

    let mut offset = 0;
    while offset < payload.len() {
        let count = (payload.len() - offset).min(MAX_PAYLOAD_LENGTH);
        let end = offset + count >= payload.len();
        sender.send_payload(
            Header::new(payload_type, count, id, end),
            payload.slice(offset..offset + count),
        )?;
        offset += count;
    }
    Ok(())
}

/// Describe an outbound content stream for a control payload.
///
/// The content type is sniffed: bytes that parse as JSON are announced as
/// `application/json`, anything else as `text/plain`.
pub(crate) fn describe_stream(stream: &MessageStream) -> StreamDescription {
    let content_type = if serde_json::from_slice::<serde_json::Value>(&stream.content).is_ok() {
        "application/json"
    } else {
        "text/plain"
    };

    StreamDescription {
        id: stream.id.to_string(),
        content_type: Some(content_type.to_string()),
        length: Some(stream.content.len()),
    }
}

/// JSON-encode the control payload announcing `request`.
///
/// # Errors
///
/// Returns [`crate::WeftError::Json`] when serialization fails.
pub(crate) fn encode_request(request: &StreamingRequest) -> Result<Bytes> {
    let payload = RequestPayload {
        verb: request.verb.clone(),
        path: Some(request.path.clone()),
        streams: request.streams.iter().map(describe_stream).collect(),
    };
    Ok(Bytes::from(serde_json::to_vec(&payload)?))
}

/// JSON-encode the control payload announcing `response`.
///
/// # Errors
///
/// Returns [`crate::WeftError::Json`] when serialization fails.
pub(crate) fn encode_response(response: &StreamingResponse) -> Result<Bytes> {
    let payload = ResponsePayload {
        status_code: response.status_code,
        streams: response.streams.iter().map(describe_stream).collect(),
    };
    Ok(Bytes::from(serde_json::to_vec(&payload)?))
}
