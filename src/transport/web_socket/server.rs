//! Server-side WebSocket connection driver.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;

use super::split_web_socket;
use crate::{
    adapter::RequestHandler,
    error::Result,
    receive::ReceiveResponse,
    request::StreamingRequest,
    transport::connection::StreamingConnection,
};

/// One accepted WebSocket connection speaking the streaming protocol.
///
/// Wraps an already-upgraded socket: accept the connection with your HTTP
/// stack of choice, then hand the socket here together with the handler
/// that answers incoming requests.
pub struct WebSocketServer {
    connection: StreamingConnection,
}

impl WebSocketServer {
    /// Wire a server connection over an accepted socket.
    #[must_use]
    pub fn new<S>(socket: WebSocketStream<S>, request_handler: Arc<dyn RequestHandler>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (send_half, receive_half) = split_web_socket(socket);
        Self {
            connection: StreamingConnection::new(
                Box::new(send_half),
                Box::new(receive_half),
                request_handler,
            ),
        }
    }

    /// Run the connection until the peer disconnects.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the receive loop, or
    /// [`crate::WeftError::InvalidState`] when called twice.
    pub async fn start(&self) -> Result<()> { self.connection.start().await }

    /// Send `request` to the connected client and await its response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Disconnected`] when the connection drops
    /// before the response arrives.
    pub async fn send(&self, request: &StreamingRequest) -> Result<ReceiveResponse> {
        self.connection.send(request).await
    }

    /// Whether both halves of the connection are live.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.connection.is_connected() }

    /// Register a callback fired once when the connection disconnects.
    pub fn set_disconnected_handler(&self, handler: crate::transport::DisconnectHandler) {
        self.connection.set_disconnected_handler(handler);
    }

    /// Tear the connection down.
    pub fn disconnect(&self) { self.connection.disconnect(); }
}

impl std::fmt::Debug for WebSocketServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketServer")
            .field("connected", &self.is_connected())
            .finish()
    }
}
