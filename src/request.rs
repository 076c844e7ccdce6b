//! Outbound request construction.
//!
//! A [`StreamingRequest`] names a verb and path and carries zero or more
//! content streams, each of which travels as its own logical stream on the
//! wire. Builders cover the common verbs; `set_body` attaches a single
//! body stream the way most callers want.

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;

/// One outbound content stream: an id plus the bytes it will carry.
#[derive(Clone, Debug)]
pub struct MessageStream {
    /// Identifier the stream travels under on the wire.
    pub id: Uuid,
    /// Complete content of the stream.
    pub content: Bytes,
}

impl MessageStream {
    /// Wrap `content` under a freshly generated stream id.
    #[must_use]
    pub fn new(content: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
        }
    }
}

/// A request to be sent over a streaming connection.
#[derive(Clone, Debug, Default)]
pub struct StreamingRequest {
    /// Request verb, e.g. `GET` or `POST`.
    pub verb: String,
    /// Request path.
    pub path: String,
    /// Content streams attached to this request, in send order.
    pub streams: Vec<MessageStream>,
}

impl StreamingRequest {
    /// Verb for retrieval requests.
    pub const GET: &'static str = "GET";
    /// Verb for submission requests.
    pub const POST: &'static str = "POST";
    /// Verb for replacement requests.
    pub const PUT: &'static str = "PUT";
    /// Verb for deletion requests.
    pub const DELETE: &'static str = "DELETE";

    /// Create a request with the given verb and path and no body.
    #[must_use]
    pub fn create_request(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            streams: Vec::new(),
        }
    }

    /// Create a `GET` request, attaching `body` when provided.
    #[must_use]
    pub fn create_get(path: impl Into<String>, body: Option<Bytes>) -> Self {
        Self::with_optional_body(Self::GET, path, body)
    }

    /// Create a `POST` request, attaching `body` when provided.
    #[must_use]
    pub fn create_post(path: impl Into<String>, body: Option<Bytes>) -> Self {
        Self::with_optional_body(Self::POST, path, body)
    }

    /// Create a `PUT` request, attaching `body` when provided.
    #[must_use]
    pub fn create_put(path: impl Into<String>, body: Option<Bytes>) -> Self {
        Self::with_optional_body(Self::PUT, path, body)
    }

    /// Create a `DELETE` request, attaching `body` when provided.
    #[must_use]
    pub fn create_delete(path: impl Into<String>, body: Option<Bytes>) -> Self {
        Self::with_optional_body(Self::DELETE, path, body)
    }

    fn with_optional_body(verb: &str, path: impl Into<String>, body: Option<Bytes>) -> Self {
        let mut request = Self::create_request(verb, path);
        if let Some(body) = body {
            request.set_body(body);
        }
        request
    }

    /// Attach `content` as a new stream under a fresh id.
    pub fn add_stream(&mut self, content: Bytes) {
        self.streams.push(MessageStream::new(content));
    }

    /// Attach `content` as a new stream under an explicit id.
    pub fn add_stream_with_id(&mut self, id: Uuid, content: Bytes) {
        self.streams.push(MessageStream { id, content });
    }

    /// Attach raw bytes as the request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) { self.add_stream(body.into()); }

    /// Serialize `body` as JSON and attach it as the request body.
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
