//! Frame reader for one connection.
//!
//! A [`PayloadReceiver`] drives the receive side: it reads the fixed-size
//! header, asks the demultiplexer to prepare an assembler for it, reads the
//! declared chunk, and hands both over. A malformed header is a protocol
//! violation that drops the connection; the frame stream cannot be
//! resynchronized without one.

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{DisconnectHandler, DisconnectedEvent, TransportReceiver};
use crate::{
    error::{Result, WeftError},
    frame::{HEADER_LENGTH, codec},
    payload::PayloadAssemblerManager,
};

struct ReceiverShared {
    connected: AtomicBool,
    manager: Mutex<Option<Arc<PayloadAssemblerManager>>>,
    on_disconnected: Mutex<Option<DisconnectHandler>>,
    shutdown: CancellationToken,
}

/// Reads raw bytes off the transport and feeds frames to the demultiplexer.
#[derive(Clone)]
pub struct PayloadReceiver {
    shared: Arc<ReceiverShared>,
}

impl Default for PayloadReceiver {
    fn default() -> Self { Self::new() }
}

impl PayloadReceiver {
    /// Create a receiver with no subscriber yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ReceiverShared {
                connected: AtomicBool::new(false),
                manager: Mutex::new(None),
                on_disconnected: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Whether the receive loop is attached to a live transport.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.shared.connected.load(Ordering::Acquire) }

    /// Register the demultiplexer that incoming frames are fed to.
    pub fn subscribe(&self, manager: Arc<PayloadAssemblerManager>) {
        *self.shared.manager.lock().expect("subscriber lock") = Some(manager);
    }

    /// Register the callback fired once when the receive loop stops.
    pub fn set_disconnected_handler(&self, handler: DisconnectHandler) {
        *self
            .shared
            .on_disconnected
            .lock()
            .expect("disconnect handler lock") = Some(handler);
    }

    /// Stop the receive loop.
    pub fn disconnect(&self) { self.shared.shutdown.cancel(); }

    /// Attach the transport and run the receive loop until the connection
    /// ends.
    ///
    /// Returns `Ok(())` when the peer closed cleanly at a frame boundary.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::InvalidState`] when no demultiplexer was
    /// subscribed, [`WeftError::Header`] on a malformed header, or a
    /// transport-level error when the connection dropped mid-frame.
    pub async fn connect(&self, mut transport: Box<dyn TransportReceiver>) -> Result<()> {
        let manager = self
            .shared
            .manager
            .lock()
            .expect("subscriber lock")
            .clone()
            .ok_or(WeftError::InvalidState("payload receiver has no subscriber"))?;

        self.shared.connected.store(true, Ordering::Release);
        let outcome = self.receive_frames(transport.as_mut(), &manager).await;
        self.shared.connected.store(false, Ordering::Release);
        transport.close().await;

        // wake anything still blocked on a partially assembled payload
        manager.close();

        let reason = match &outcome {
            Ok(()) => "transport closed".to_string(),
            Err(receive_error) => {
                error!(error = %receive_error, "receive loop failed");
                receive_error.to_string()
            }
        };
        let handler = self
            .shared
            .on_disconnected
            .lock()
            .expect("disconnect handler lock")
            .take();
        if let Some(handler) = handler {
            handler(DisconnectedEvent::new(reason));
        }

        outcome
    }

    async fn receive_frames(
        &self,
        transport: &mut dyn TransportReceiver,
        manager: &PayloadAssemblerManager,
    ) -> Result<()> {
        let mut header_buffer = [0_u8; HEADER_LENGTH];

        loop {
            match self.read_exact(transport, &mut header_buffer, true).await? {
                ReadOutcome::Closed => return Ok(()),
                ReadOutcome::Filled => {}
            }

            let header = codec::deserialize(&header_buffer)?;
            debug!(%header, "frame received");
            manager.ensure_assembler(&header);

            let mut chunk = vec![0_u8; header.payload_length];
            if header.payload_length > 0 {
                match self.read_exact(transport, &mut chunk, false).await? {
                    ReadOutcome::Closed => {
                        return Err(WeftError::Disconnected(
                            "transport closed while reading a payload chunk".into(),
                        ));
                    }
                    ReadOutcome::Filled => {}
                }
            }

            manager.on_receive(&header, chunk)?;
        }
    }

    /// Fill `buffer` completely from the transport.
    ///
    /// `clean_close_ok` permits a zero-byte read before the first byte of
    /// the buffer, which is how an orderly peer shutdown appears at a frame
    /// boundary; a close part-way through is always an error.
    async fn read_exact(
        &self,
        transport: &mut dyn TransportReceiver,
        buffer: &mut [u8],
        clean_close_ok: bool,
    ) -> Result<ReadOutcome> {
        let mut offset = 0;
        while offset < buffer.len() {
            let count = tokio::select! {
                () = self.shared.shutdown.cancelled() => {
                    return Err(WeftError::Disconnected("receiver disconnected locally".into()));
                }
                count = transport.receive(&mut buffer[offset..]) => count?,
            };

            if count == 0 {
                if offset == 0 && clean_close_ok {
                    return Ok(ReadOutcome::Closed);
                }
                return Err(WeftError::Disconnected(
                    "transport closed in the middle of a frame".into(),
                ));
            }
            offset += count;
        }
        Ok(ReadOutcome::Filled)
    }
}

impl std::fmt::Debug for PayloadReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadReceiver")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

enum ReadOutcome {
    Filled,
    Closed,
}
