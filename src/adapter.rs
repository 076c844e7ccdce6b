//! Orchestration of one streaming connection.
//!
//! The [`ProtocolAdapter`] wires the sender, receiver, demultiplexer, and
//! request manager together: outbound requests are disassembled and their
//! responses awaited by id; fully assembled incoming requests are handed
//! to the [`RequestHandler`]; incoming responses resolve their pending
//! waiters; prematurely closed streams notify the peer with a
//! cancel-stream frame.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::Result,
    payload::{
        PayloadAssemblerManager,
        ReceiveRequestCallback,
        ReceiveResponseCallback,
        RequestManager,
        SendOperations,
        StreamManager,
    },
    receive::{ReceiveRequest, ReceiveResponse},
    request::StreamingRequest,
    response::StreamingResponse,
    transport::{DisconnectedEvent, PayloadReceiver, PayloadSender},
};

/// Application callback for locally received requests.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Produce the response for one fully announced incoming request.
    ///
    /// The request's content streams may still be filling; read them
    /// lazily. Returning an error sends nothing back to the peer.
    ///
    /// # Errors
    ///
    /// Implementations surface their own failures; the adapter logs them
    /// and leaves the peer's wait to its own timeout.
    async fn process_request(&self, request: ReceiveRequest) -> Result<StreamingResponse>;
}

/// Ties one connection's send and receive machinery together.
pub struct ProtocolAdapter {
    request_manager: RequestManager,
    send_operations: SendOperations,
    assembler_manager: Arc<PayloadAssemblerManager>,
}

impl ProtocolAdapter {
    /// Wire a connection from its collaborators.
    ///
    /// Subscribes the receiver to a freshly built demultiplexer whose
    /// callbacks route requests to `request_handler` and responses to
    /// `request_manager`.
    #[must_use]
    pub fn new(
        request_handler: Arc<dyn RequestHandler>,
        request_manager: RequestManager,
        payload_sender: &PayloadSender,
        payload_receiver: &PayloadReceiver,
    ) -> Self {
        let send_operations = SendOperations::new(payload_sender.clone());

        let stream_manager = StreamManager::new({
            let operations = send_operations.clone();
            Box::new(move |assembler| {
                // fire-and-forget: the peer may already be gone
                if let Err(send_error) = operations.send_cancel_stream(assembler.identifier()) {
                    warn!(error = %send_error, "failed to send cancel-stream frame");
                }
            })
        });

        let on_receive_request: ReceiveRequestCallback = {
            let operations = send_operations.clone();
            Arc::new(move |id, request| {
                let handler = Arc::clone(&request_handler);
                let operations = operations.clone();
                Box::pin(async move {
                    match handler.process_request(request).await {
                        Ok(response) => {
                            if let Err(send_error) = operations.send_response(id, &response) {
                                warn!(error = %send_error, "failed to send response");
                            }
                        }
                        Err(handler_error) => {
                            warn!(error = %handler_error, "request handler failed");
                        }
                    }
                })
            })
        };

        let on_receive_response: ReceiveResponseCallback = {
            let request_manager = request_manager.clone();
            Arc::new(move |id, response| {
                let request_manager = request_manager.clone();
                Box::pin(async move {
                    request_manager.signal_response(id, response);
                })
            })
        };

        let assembler_manager = Arc::new(PayloadAssemblerManager::new(
            stream_manager,
            payload_sender.cancellations(),
            on_receive_request,
            on_receive_response,
        ));
        payload_receiver.subscribe(Arc::clone(&assembler_manager));

        Self {
            request_manager,
            send_operations,
            assembler_manager,
        }
    }

    /// Send `request` and await its correlated response.
    ///
    /// The response wait is registered before the first frame is enqueued,
    /// so a response can never race past its waiter.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Disconnected`] when the connection drops
    /// before the response arrives, or the underlying send failure when
    /// disassembly fails.
    pub async fn send_request(&self, request: &StreamingRequest) -> Result<ReceiveResponse> {
        let id = Uuid::new_v4();
        let pending = self.request_manager.register(id)?;
        self.send_operations.send_request(id, request)?;
        pending.await_response().await
    }

    /// Send-side operations for this connection.
    #[must_use]
    pub fn send_operations(&self) -> &SendOperations { &self.send_operations }

    /// Fail pending waiters and tear down assembly state after a
    /// disconnect.
    pub fn handle_disconnect(&self, event: &DisconnectedEvent) {
        warn!(reason = %event.reason, "connection disconnected");
        self.request_manager.fail_all_pending();
        self.assembler_manager.close();
    }
}

impl std::fmt::Debug for ProtocolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolAdapter")
            .field("pending_requests", &self.request_manager.pending_len())
            .finish_non_exhaustive()
    }
}
