//! Assembled, user-facing requests and responses.
//!
//! A [`ReceiveRequest`] or [`ReceiveResponse`] is handed to callers once
//! its control payload has been assembled and each announced stream has
//! been resolved to a live [`ContentStream`]. The streams may still be
//! filling when the value is delivered; their content is read lazily.

use serde::de::DeserializeOwned;

use crate::{error::Result, payload::ContentStream};

/// A fully announced incoming request.
#[derive(Debug)]
pub struct ReceiveRequest {
    /// Request verb, e.g. `GET` or `POST`.
    pub verb: String,
    /// Request path.
    pub path: String,
    /// Content streams announced by the request, in order.
    pub streams: Vec<ContentStream>,
}

impl ReceiveRequest {
    /// Drain the first content stream and return its bytes.
    ///
    /// Returns an empty buffer when the request announced no streams.
    pub async fn read_body(&self) -> Vec<u8> { read_first_stream(&self.streams).await }

    /// Drain the first content stream and decode it as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Io`] when the bytes are not valid
    /// UTF-8 text.
    pub async fn read_body_as_str(&self) -> Result<String> {
        bytes_to_string(self.read_body().await)
    }

    /// Drain the first content stream and deserialize it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Json`] when the bytes do not parse as a
    /// `T`.
    pub async fn read_body_as_json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.read_body().await)?)
    }
}

/// A fully announced incoming response.
#[derive(Debug)]
pub struct ReceiveResponse {
    /// Numeric status code of the response.
    pub status_code: u16,
    /// Content streams announced by the response, in order.
    pub streams: Vec<ContentStream>,
}

impl ReceiveResponse {
    /// Drain the first content stream and return its bytes.
    ///
    /// Returns an empty buffer when the response announced no streams.
    pub async fn read_body(&self) -> Vec<u8> { read_first_stream(&self.streams).await }

    /// Drain the first content stream and decode it as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Io`] when the bytes are not valid
    /// UTF-8 text.
    pub async fn read_body_as_str(&self) -> Result<String> {
        bytes_to_string(self.read_body().await)
    }

    /// Drain the first content stream and deserialize it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Json`] when the bytes do not parse as a
    /// `T`.
    pub async fn read_body_as_json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.read_body().await)?)
    }
}

async fn read_first_stream(streams: &[ContentStream]) -> Vec<u8> {
    match streams.first() {
        Some(stream) => stream.read_until_end().await,
        None => Vec::new(),
    }
}

fn bytes_to_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|error| {
        crate::WeftError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, error))
    })
}
