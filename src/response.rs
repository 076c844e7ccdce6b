//! Outbound response construction.
//!
//! A [`StreamingResponse`] mirrors [`StreamingRequest`](crate::StreamingRequest)
//! on the answering side: a status code plus content streams. Shorthand
//! constructors cover the statuses request handlers reach for most.

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::Result, request::MessageStream};

/// A response to be sent over a streaming connection.
#[derive(Clone, Debug, Default)]
pub struct StreamingResponse {
    /// Numeric status code of the response.
    pub status_code: u16,
    /// Content streams attached to this response, in send order.
    pub streams: Vec<MessageStream>,
}

impl StreamingResponse {
    /// Create a response with the given status, attaching `body` when
    /// provided.
    #[must_use]
    pub fn create_response(status_code: u16, body: Option<Bytes>) -> Self {
        let mut response = Self {
            status_code,
            streams: Vec::new(),
        };
        if let Some(body) = body {
            response.set_body(body);
        }
        response
    }

    /// A `200 OK` response.
    #[must_use]
    pub fn ok(body: Option<Bytes>) -> Self { Self::create_response(200, body) }

    /// A `403 Forbidden` response.
    #[must_use]
    pub fn forbidden(body: Option<Bytes>) -> Self { Self::create_response(403, body) }

    /// A `404 Not Found` response.
    #[must_use]
    pub fn not_found(body: Option<Bytes>) -> Self { Self::create_response(404, body) }

    /// A `500 Internal Server Error` response.
    #[must_use]
    pub fn internal_server_error(body: Option<Bytes>) -> Self {
        Self::create_response(500, body)
    }

    /// Attach `content` as a new stream under a fresh id.
    pub fn add_stream(&mut self, content: Bytes) {
        self.streams.push(MessageStream::new(content));
    }

    /// Attach `content` as a new stream under an explicit id.
    pub fn add_stream_with_id(&mut self, id: Uuid, content: Bytes) {
        self.streams.push(MessageStream { id, content });
    }

    /// Attach raw bytes as the response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) { self.add_stream(body.into()); }

    /// Serialize `body` as JSON and attach it as the response body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Json`] when `body` fails to serialize.
    pub fn set_json_body<T: Serialize>(&mut self, body: &T) -> Result<()> {
        let encoded = serde_json::to_vec(body)?;
        self.add_stream(Bytes::from(encoded));
        Ok(())
    }
}
