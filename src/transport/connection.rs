//! Reusable wiring for one full-duplex streaming connection.
//!
//! [`StreamingConnection`] owns the sender, receiver, and protocol adapter
//! for a single connection over any pair of transport halves. The
//! WebSocket drivers wrap it; tests drive it directly over in-memory
//! channels. Either half disconnecting tears the other down and fails all
//! pending response waits.

use std::sync::{Arc, Mutex};

use super::{
    DisconnectHandler,
    PayloadReceiver,
    PayloadSender,
    TransportReceiver,
    TransportSender,
};
use crate::{
    adapter::{ProtocolAdapter, RequestHandler},
    error::{Result, WeftError},
    payload::{CancellationRegistry, RequestManager},
    receive::ReceiveResponse,
    request::StreamingRequest,
};

type Halves = (Box<dyn TransportSender>, Box<dyn TransportReceiver>);

/// One wired connection awaiting or running its receive loop.
pub struct StreamingConnection {
    payload_sender: PayloadSender,
    payload_receiver: PayloadReceiver,
    adapter: Arc<ProtocolAdapter>,
    halves: Mutex<Option<Halves>>,
    on_disconnected: Arc<Mutex<Option<DisconnectHandler>>>,
}

impl StreamingConnection {
    /// Wire a connection over the given transport halves.
    #[must_use]
    pub fn new(
        send_half: Box<dyn TransportSender>,
        receive_half: Box<dyn TransportReceiver>,
        request_handler: Arc<dyn RequestHandler>,
    ) -> Self {
        let payload_sender = PayloadSender::new(CancellationRegistry::new());
        let payload_receiver = PayloadReceiver::new();
        let adapter = Arc::new(ProtocolAdapter::new(
            request_handler,
            RequestManager::new(),
            &payload_sender,
            &payload_receiver,
        ));

        let on_disconnected: Arc<Mutex<Option<DisconnectHandler>>> = Arc::new(Mutex::new(None));

        payload_sender.set_disconnected_handler({
            let adapter = Arc::clone(&adapter);
            let receiver = payload_receiver.clone();
            let on_disconnected = Arc::clone(&on_disconnected);
            Box::new(move |event| {
                receiver.disconnect();
                adapter.handle_disconnect(&event);
                if let Some(handler) = on_disconnected.lock().expect("handler lock").take() {
                    handler(event);
                }
            })
        });
        payload_receiver.set_disconnected_handler({
            let adapter = Arc::clone(&adapter);
            let sender = payload_sender.clone();
            let on_disconnected = Arc::clone(&on_disconnected);
            Box::new(move |event| {
                sender.disconnect();
                adapter.handle_disconnect(&event);
                if let Some(handler) = on_disconnected.lock().expect("handler lock").take() {
                    handler(event);
                }
            })
        });

        Self {
            payload_sender,
            payload_receiver,
            adapter,
            halves: Mutex::new(Some((send_half, receive_half))),
            on_disconnected,
        }
    }

    /// Register a callback fired once when either half of the connection
    /// disconnects.
    pub fn set_disconnected_handler(&self, handler: DisconnectHandler) {
        *self.on_disconnected.lock().expect("handler lock") = Some(handler);
    }

    /// Attach the transports and run the receive loop until the connection
    /// ends.
    ///
    /// Returns `Ok(())` when the peer closed cleanly at a frame boundary.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::InvalidState`] when called twice, or the error
    /// that ended the receive loop.
    pub async fn start(&self) -> Result<()> {
        let (send_half, receive_half) = self
            .halves
            .lock()
            .expect("transport halves lock")
            .take()
            .ok_or(WeftError::InvalidState("connection already started"))?;

        self.payload_sender.connect(send_half)?;
        self.payload_receiver.connect(receive_half).await
    }

    /// Send `request` and await its correlated response.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Disconnected`] when the connection drops before
    /// the response arrives.
    pub async fn send(&self, request: &StreamingRequest) -> Result<ReceiveResponse> {
        self.adapter.send_request(request).await
    }

    /// Whether both halves are attached to live transports.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.payload_sender.is_connected() && self.payload_receiver.is_connected()
    }

    /// Tear the connection down.
    pub fn disconnect(&self) {
        self.payload_sender.disconnect();
        self.payload_receiver.disconnect();
    }
}

impl std::fmt::Debug for StreamingConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingConnection")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
