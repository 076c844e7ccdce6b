//! Transport-facing halves of the protocol.
//!
//! The protocol treats its carrier as an opaque, reliable, ordered byte
//! channel. [`TransportSender`] and [`TransportReceiver`] are the seam a
//! concrete carrier adapts to; [`PayloadSender`] and [`PayloadReceiver`]
//! sit above that seam and speak frames. A WebSocket adapter ships in
//! [`web_socket`]; anything with the same contract (a named pipe, an
//! in-memory duplex) plugs in the same way.

pub mod connection;
pub mod receiver;
pub mod sender;
pub mod web_socket;

pub use connection::StreamingConnection;
pub use receiver::PayloadReceiver;
pub use sender::PayloadSender;

use async_trait::async_trait;

/// Raised when either half of a connection stops.
#[derive(Clone, Debug)]
pub struct DisconnectedEvent {
    /// Human-readable cause of the disconnect.
    pub reason: String,
}

impl DisconnectedEvent {
    /// Create an event with the given cause.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Callback fired once when a transport half disconnects.
pub type DisconnectHandler = Box<dyn FnOnce(DisconnectedEvent) + Send>;

/// Writing half of a byte channel.
#[async_trait]
pub trait TransportSender: Send {
    /// Whether the channel can still accept writes.
    fn is_connected(&self) -> bool;

    /// Write `buffer` to the channel, returning the bytes written.
    ///
    /// A return of `Ok(0)` means the channel is closed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the write fails.
    async fn send(&mut self, buffer: &[u8]) -> std::io::Result<usize>;

    /// Close the channel.
    async fn close(&mut self);
}

/// Reading half of a byte channel.
#[async_trait]
pub trait TransportReceiver: Send {
    /// Whether the channel can still produce reads.
    fn is_connected(&self) -> bool;

    /// Read up to `buffer.len()` bytes, returning the bytes read.
    ///
    /// A return of `Ok(0)` means the channel is closed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the read fails.
    async fn receive(&mut self, buffer: &mut [u8]) -> std::io::Result<usize>;

    /// Close the channel.
    async fn close(&mut self);
}
