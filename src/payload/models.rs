//! JSON models for control payloads.
//!
//! A request or response travels as its own logical stream whose bytes are
//! one JSON document describing the exchange and announcing the content
//! streams that follow. Field names here are wire-format: a stream's
//! content type serializes as `"type"` and a response's status as
//! `"statusCode"`.

use serde::{Deserialize, Serialize};

/// Announcement of one content stream inside a control payload.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StreamDescription {
    /// UUID string identifying the announced stream.
    pub id: String,
    /// MIME-like content type of the stream's bytes.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Declared byte length of the stream's content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

/// Control payload body for request frames.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestPayload {
    /// Request verb, e.g. `GET` or `POST`.
    pub verb: String,
    /// Request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Content streams announced by this request, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<StreamDescription>,
}

/// Control payload body for response frames.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    /// Numeric status code of the response.
    pub status_code: u16,
    /// Content streams announced by this response, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<StreamDescription>,
}

/// Strip a UTF-8 byte-order mark, if present, before JSON parsing.
///
/// Peer implementations have been observed to emit control payloads with a
/// leading BOM.
#[must_use]
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}
