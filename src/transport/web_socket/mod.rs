//! WebSocket adaptation of the byte-channel contract.
//!
//! A WebSocket delivers whole binary messages; the protocol wants a plain
//! byte stream. The receive half buffers message payloads and serves them
//! out in whatever read sizes the frame reader asks for; the send half
//! writes each buffer as one binary message. The socket is split so the
//! sender and receiver tasks can own their halves independently.

pub mod client;
pub mod server;

pub use client::WebSocketClient;
pub use server::WebSocketServer;

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use futures::{
    SinkExt,
    StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};

use super::{TransportReceiver, TransportSender};

/// Writing half of a split WebSocket.
pub struct WebSocketSendHalf<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    connected: bool,
}

/// Reading half of a split WebSocket.
pub struct WebSocketReceiveHalf<S> {
    stream: SplitStream<WebSocketStream<S>>,
    pending: BytesMut,
    connected: bool,
}

/// Split a WebSocket into transport halves.
#[must_use]
pub fn split_web_socket<S>(
    socket: WebSocketStream<S>,
) -> (WebSocketSendHalf<S>, WebSocketReceiveHalf<S>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = socket.split();
    (
        WebSocketSendHalf {
            sink,
            connected: true,
        },
        WebSocketReceiveHalf {
            stream,
            pending: BytesMut::new(),
            connected: true,
        },
    )
}

#[async_trait]
impl<S> TransportSender for WebSocketSendHalf<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn is_connected(&self) -> bool { self.connected }

    async fn send(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
        let message = Message::Binary(Bytes::copy_from_slice(buffer));
        match self.sink.send(message).await {
            Ok(()) => Ok(buffer.len()),
            Err(send_error) => {
                self.connected = false;
                Err(std::io::Error::other(send_error))
            }
        }
    }

    async fn close(&mut self) {
        self.connected = false;
        // already-closed sockets error here, which is the state we want
        let _ = self.sink.close().await;
    }
}

#[async_trait]
impl<S> TransportReceiver for WebSocketReceiveHalf<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn is_connected(&self) -> bool { self.connected }

    async fn receive(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        while self.pending.is_empty() {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => self.pending.extend_from_slice(&data),
                Some(Ok(Message::Close(_))) | None => {
                    self.connected = false;
                    return Ok(0);
                }
                // control frames are answered by the library
                Some(Ok(_)) => {}
                Some(Err(receive_error)) => {
                    self.connected = false;
                    return Err(std::io::Error::other(receive_error));
                }
            }
        }

        let count = self.pending.len().min(buffer.len());
        buffer[..count].copy_from_slice(&self.pending[..count]);
        self.pending.advance(count);
        Ok(count)
    }

    async fn close(&mut self) { self.connected = false; }
}
