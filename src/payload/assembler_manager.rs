//! Top-level demultiplexer for incoming frames.
//!
//! Given a decoded header, the manager decides whether the following chunk
//! is raw content for an announced stream, part of a request/response
//! control payload, or a cancellation, and dispatches accordingly. Control
//! assemblers are tracked per stream id and removed once their end frame
//! has been processed.

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{
    cancellation::CancellationRegistry,
    receive_assembler::{
        ReceiveRequestAssembler,
        ReceiveRequestCallback,
        ReceiveResponseAssembler,
        ReceiveResponseCallback,
    },
    stream_manager::StreamManager,
};
use crate::{
    error::Result,
    frame::{Header, PayloadType},
};

enum ControlAssembler {
    Request(ReceiveRequestAssembler),
    Response(ReceiveResponseAssembler),
}

impl ControlAssembler {
    fn on_receive(&self, header: &Header, chunk: &[u8]) -> Result<()> {
        match self {
            Self::Request(assembler) => assembler.on_receive(header, chunk),
            Self::Response(assembler) => assembler.on_receive(header, chunk),
        }
    }
}

/// Routes each incoming frame to the assembler responsible for it.
pub struct PayloadAssemblerManager {
    stream_manager: StreamManager,
    cancellations: CancellationRegistry,
    on_receive_request: ReceiveRequestCallback,
    on_receive_response: ReceiveResponseCallback,
    active_assemblers: DashMap<Uuid, ControlAssembler>,
}

impl PayloadAssemblerManager {
    /// Create a demultiplexer for one connection.
    #[must_use]
    pub fn new(
        stream_manager: StreamManager,
        cancellations: CancellationRegistry,
        on_receive_request: ReceiveRequestCallback,
        on_receive_response: ReceiveResponseCallback,
    ) -> Self {
        Self {
            stream_manager,
            cancellations,
            on_receive_request,
            on_receive_response,
            active_assemblers: DashMap::new(),
        }
    }

    /// Make sure an assembler exists for the frame this header announces.
    ///
    /// Called by the receiver before the frame's chunk is read. `Stream`
    /// frames may legitimately arrive before the control payload that
    /// announces them; the stream-manager entry is created speculatively
    /// and its content type/length validated once the control payload
    /// resolves.
    pub fn ensure_assembler(&self, header: &Header) {
        match header.payload_type {
            PayloadType::Stream => {
                let _ = self.stream_manager.get_payload_stream(header);
            }
            PayloadType::Request => {
                self.active_assemblers.entry(header.id).or_insert_with(|| {
                    ControlAssembler::Request(ReceiveRequestAssembler::new(
                        header,
                        self.stream_manager.clone(),
                        self.on_receive_request.clone(),
                    ))
                });
            }
            PayloadType::Response => {
                self.active_assemblers.entry(header.id).or_insert_with(|| {
                    ControlAssembler::Response(ReceiveResponseAssembler::new(
                        header,
                        self.stream_manager.clone(),
                        self.on_receive_response.clone(),
                    ))
                });
            }
            PayloadType::CancelAll | PayloadType::CancelStream => {}
        }
    }

    /// Dispatch one complete frame chunk.
    ///
    /// # Errors
    ///
    /// Fails when a completed control payload is malformed; the receiver
    /// treats that as a protocol violation and drops the connection.
    pub fn on_receive(&self, header: &Header, chunk: Vec<u8>) -> Result<()> {
        match header.payload_type {
            PayloadType::Stream => {
                self.stream_manager.on_receive(header, chunk);
                Ok(())
            }
            PayloadType::Request | PayloadType::Response => {
                match self.active_assemblers.get(&header.id) {
                    Some(assembler) => {
                        let outcome = assembler.on_receive(header, &chunk);
                        drop(assembler);
                        if header.end {
                            self.active_assemblers.remove(&header.id);
                        }
                        outcome
                    }
                    // cancellation can race with in-flight control frames
                    None => {
                        debug!(stream = %header.id, "dropping control frame for unknown id");
                        Ok(())
                    }
                }
            }
            PayloadType::CancelStream => {
                debug!(stream = %header.id, "peer cancelled stream");
                self.cancellations.cancel(header.id);
                Ok(())
            }
            PayloadType::CancelAll => {
                debug!("peer cancelled all streams");
                self.cancellations.cancel_all();
                Ok(())
            }
        }
    }

    /// Drop all per-connection assembly state, waking suspended readers.
    pub fn close(&self) {
        self.active_assemblers.clear();
        self.stream_manager.close_all();
    }
}
