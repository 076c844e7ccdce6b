//! Frame writer for one connection.
//!
//! A [`PayloadSender`] is the sole writer to its transport: callers enqueue
//! `(header, chunk)` packets without suspending, and a single writer task
//! serializes and writes them in order, so frames are never interleaved
//! mid-write. Content frames for streams the peer has cancelled are
//! dropped at dequeue time, which aborts an in-progress transfer between
//! chunks.

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{DisconnectHandler, DisconnectedEvent, TransportSender};
use crate::{
    error::{Result, WeftError},
    frame::{Header, codec},
    payload::CancellationRegistry,
};

struct SendPacket {
    header: Header,
    payload: Bytes,
}

struct SenderShared {
    connected: AtomicBool,
    queue: Mutex<Option<mpsc::UnboundedReceiver<SendPacket>>>,
    on_disconnected: Mutex<Option<DisconnectHandler>>,
    shutdown: CancellationToken,
    cancellations: CancellationRegistry,
}

/// Ordered, non-suspending frame queue in front of a transport.
#[derive(Clone)]
pub struct PayloadSender {
    packets: mpsc::UnboundedSender<SendPacket>,
    shared: Arc<SenderShared>,
}

impl PayloadSender {
    /// Create a sender whose writer consults `cancellations` before each
    /// content frame.
    #[must_use]
    pub fn new(cancellations: CancellationRegistry) -> Self {
        let (packets, queue) = mpsc::unbounded_channel();
        Self {
            packets,
            shared: Arc::new(SenderShared {
                connected: AtomicBool::new(false),
                queue: Mutex::new(Some(queue)),
                on_disconnected: Mutex::new(None),
                shutdown: CancellationToken::new(),
                cancellations,
            }),
        }
    }

    /// Whether the writer task is attached to a live transport.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.shared.connected.load(Ordering::Acquire) }

    /// Registry of outbound streams the peer has cancelled.
    #[must_use]
    pub fn cancellations(&self) -> CancellationRegistry { self.shared.cancellations.clone() }

    /// Register the callback fired once when the writer stops.
    pub fn set_disconnected_handler(&self, handler: DisconnectHandler) {
        *self
            .shared
            .on_disconnected
            .lock()
            .expect("disconnect handler lock") = Some(handler);
    }

    /// Attach the transport and start the writer task.
    ///
    /// Packets enqueued before connecting are written once the transport
    /// attaches.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::InvalidState`] when the sender was already
    /// connected.
    pub fn connect(&self, transport: Box<dyn TransportSender>) -> Result<()> {
        let queue = self
            .shared
            .queue
            .lock()
            .expect("send queue lock")
            .take()
            .ok_or(WeftError::InvalidState("payload sender already connected"))?;

        self.shared.connected.store(true, Ordering::Release);
        tokio::spawn(write_loop(queue, transport, Arc::clone(&self.shared)));
        Ok(())
    }

    /// Enqueue one frame. Never suspends.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Disconnected`] once the writer has stopped.
    pub fn send_payload(&self, header: Header, payload: Bytes) -> Result<()> {
        self.packets
            .send(SendPacket { header, payload })
            .map_err(|_| WeftError::Disconnected("send queue closed".into()))
    }

    /// Stop the writer task and close the transport.
    pub fn disconnect(&self) { self.shared.shutdown.cancel(); }
}

impl std::fmt::Debug for PayloadSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadSender")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

async fn write_loop(
    mut queue: mpsc::UnboundedReceiver<SendPacket>,
    mut transport: Box<dyn TransportSender>,
    shared: Arc<SenderShared>,
) {
    let reason = loop {
        let packet = tokio::select! {
            () = shared.shutdown.cancelled() => break "sender disconnected locally".to_string(),
            packet = queue.recv() => match packet {
                Some(packet) => packet,
                None => break "send queue dropped".to_string(),
            },
        };

        if packet.header.payload_type.is_stream()
            && shared.cancellations.is_cancelled(packet.header.id)
        {
            debug!(stream = %packet.header.id, "dropping frame for cancelled stream");
            continue;
        }

        if let Err(write_error) = write_packet(transport.as_mut(), &packet).await {
            error!(error = %write_error, "transport write failed");
            break write_error.to_string();
        }
    };

    shared.connected.store(false, Ordering::Release);
    queue.close();
    transport.close().await;

    let handler = shared
        .on_disconnected
        .lock()
        .expect("disconnect handler lock")
        .take();
    if let Some(handler) = handler {
        handler(DisconnectedEvent::new(reason));
    }
}

async fn write_packet(
    transport: &mut dyn TransportSender,
    packet: &SendPacket,
) -> Result<()> {
    let header_bytes = codec::serialize(&packet.header)?;
    write_all(transport, &header_bytes).await?;
    if !packet.payload.is_empty() {
        write_all(transport, &packet.payload).await?;
    }
    Ok(())
}

async fn write_all(transport: &mut dyn TransportSender, mut buffer: &[u8]) -> Result<()> {
    while !buffer.is_empty() {
        let written = transport.send(buffer).await?;
        if written == 0 {
            return Err(WeftError::Disconnected(
                "transport closed while writing a frame".into(),
            ));
        }
        buffer = &buffer[written..];
    }
    Ok(())
}
