//! Client-side WebSocket connection driver.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::{WebSocketStream, connect_async};

use super::split_web_socket;
use crate::{
    adapter::RequestHandler,
    error::{Result, WeftError},
    receive::ReceiveResponse,
    request::StreamingRequest,
    transport::connection::StreamingConnection,
};

/// One outbound WebSocket connection speaking the streaming protocol.
///
/// The protocol is symmetric once connected: the client sends requests
/// with [`WebSocketClient::send`] and answers the server's own requests
/// through its [`RequestHandler`].
pub struct WebSocketClient {
    connection: StreamingConnection,
}

impl WebSocketClient {
    /// Dial `url` and wire a client connection over the resulting socket.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Disconnected`] when the WebSocket handshake
    /// fails.
    pub async fn connect(url: &str, request_handler: Arc<dyn RequestHandler>) -> Result<Self> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|handshake_error| WeftError::Disconnected(handshake_error.to_string()))?;
        Ok(Self::from_socket(socket, request_handler))
    }

    /// Wire a client connection over an already-established socket.
    #[must_use]
    pub fn from_socket<S>(
        socket: WebSocketStream<S>,
        request_handler: Arc<dyn RequestHandler>,
    ) -> Self
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

    /// Run the connection until the server disconnects.
    ///
    /// Callers usually spawn this and issue [`WebSocketClient::send`] calls
    /// from other tasks.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the receive loop, or
    /// [`crate::WeftError::InvalidState`] when called twice.
    pub async fn start(&self) -> Result<()> { self.connection.start().await }

    /// Send `request` to the server and await its response.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Disconnected`] when the connection drops before
    /// the response arrives.
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

impl std::fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("connected", &self.is_connected())
            .finish()
    }
}
