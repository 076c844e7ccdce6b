//! Canonical error and result types for the crate.
//!
//! `WeftError` is the single public error surface: header-level protocol
//! violations, transport faults, malformed control payloads, and
//! correlation misuse all funnel into it.

use uuid::Uuid;

use crate::frame::HeaderError;

/// Top-level error type exposed by `weft`.
#[derive(Debug)]
pub enum WeftError {
    /// A frame header violated the fixed wire layout.
    Header(HeaderError),
    /// An error in the underlying transport (for example, a socket close).
    Io(std::io::Error),
    /// A control payload failed to parse or serialize as JSON.
    Json(serde_json::Error),
    /// The connection dropped before the operation completed.
    Disconnected(String),
    /// A response wait was already registered for this request id.
    PendingResponse(Uuid),
    /// A stream description carried an id that is not a UUID.
    InvalidStreamId(String),
    /// A component was driven outside its lifecycle contract, such as
    /// connecting a sender twice.
    InvalidState(&'static str),
}

impl From<HeaderError> for WeftError {
    fn from(error: HeaderError) -> Self { Self::Header(error) }
}

impl From<std::io::Error> for WeftError {
    fn from(error: std::io::Error) -> Self { Self::Io(error) }
}

impl From<serde_json::Error> for WeftError {
    fn from(error: serde_json::Error) -> Self { Self::Json(error) }
}

impl std::fmt::Display for WeftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header(error) => write!(f, "malformed frame header: {error}"),
            Self::Io(error) => write!(f, "transport error: {error}"),
            Self::Json(error) => write!(f, "control payload error: {error}"),
            Self::Disconnected(reason) => write!(f, "connection disconnected: {reason}"),
            Self::PendingResponse(id) => {
                write!(f, "a response wait is already pending for request {id}")
            }
            Self::InvalidStreamId(id) => write!(f, "stream description id '{id}' is not a uuid"),
            Self::InvalidState(detail) => write!(f, "invalid state: {detail}"),
        }
    }
}

impl std::error::Error for WeftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Header(error) => Some(error),
            Self::Io(error) => Some(error),
            Self::Json(error) => Some(error),
            Self::Disconnected(_)
            | Self::PendingResponse(_)
            | Self::InvalidStreamId(_)
            | Self::InvalidState(_) => None,
        }
    }
}

/// Canonical result alias used by `weft` public APIs.
pub type Result<T> = std::result::Result<T, WeftError>;
