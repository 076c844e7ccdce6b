//! Assembly of incoming control payloads into user-facing values.
//!
//! Request and response control payloads arrive as ordinary frame chunks.
//! An assembler accumulates them until the end frame, parses the JSON
//! body, resolves each announced stream description into a live
//! [`ContentStream`] (pre-registering it with the stream manager so later
//! content frames find their target), and hands the finished value to the
//! registered completion callback on its own task.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use uuid::Uuid;

use super::{
    content_stream::ContentStream,
    models::{self, RequestPayload, ResponsePayload, StreamDescription},
    stream_manager::StreamManager,
};
use crate::{
    error::{Result, WeftError},
    frame::Header,
    receive::{ReceiveRequest, ReceiveResponse},
};

/// Callback invoked once an incoming request is fully announced.
pub type ReceiveRequestCallback =
    Arc<dyn Fn(Uuid, ReceiveRequest) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked once an incoming response is fully announced.
pub type ReceiveResponseCallback =
    Arc<dyn Fn(Uuid, ReceiveResponse) -> BoxFuture<'static, ()> + Send + Sync>;

/// Resolve announced stream descriptions into live content streams.
///
/// Registers each stream with the manager as a side effect, so content
/// frames that raced ahead of the control payload are already flowing into
/// the right assembler.
fn resolve_content_streams(
    stream_manager: &StreamManager,
    descriptions: Vec<StreamDescription>,
) -> Result<Vec<ContentStream>> {
    descriptions
        .into_iter()
        .map(|description| {
            let id = Uuid::parse_str(&description.id)
                .map_err(|_| WeftError::InvalidStreamId(description.id.clone()))?;
            let assembler = stream_manager.get_payload_assembler(id);
            assembler.set_description(description.content_type, description.length);
            Ok(ContentStream::new(id, assembler))
        })
        .collect()
}

pub(crate) struct ReceiveRequestAssembler {
    identifier: Uuid,
    stream_manager: StreamManager,
    buffer: Mutex<Vec<u8>>,
    on_completed: ReceiveRequestCallback,
}

impl ReceiveRequestAssembler {
    pub(crate) fn new(
        header: &Header,
        stream_manager: StreamManager,
        on_completed: ReceiveRequestCallback,
    ) -> Self {
        Self {
            identifier: header.id,
            stream_manager,
            buffer: Mutex::new(Vec::new()),
            on_completed,
        }
    }

    /// Accept one chunk of the request control payload.
    ///
    /// # Errors
    ///
    /// Fails when the end frame completes a payload that does not parse as
    /// request JSON, or that announces a stream with a non-UUID id. Either
    /// is a protocol violation surfaced to the receiver loop.
    pub(crate) fn on_receive(&self, header: &Header, chunk: &[u8]) -> Result<()> {
        let mut buffer = self.buffer.lock().expect("control payload buffer lock");
        buffer.extend_from_slice(chunk);
        if !header.end {
            return Ok(());
        }

        let body = std::mem::take(&mut *buffer);
        drop(buffer);

        let payload: RequestPayload = serde_json::from_slice(models::strip_bom(&body))?;
        let streams = resolve_content_streams(&self.stream_manager, payload.streams)?;
        let request = ReceiveRequest {
            verb: payload.verb,
            path: payload.path.unwrap_or_default(),
            streams,
        };

        // handle the request without stalling the receive loop
        tokio::spawn((self.on_completed)(self.identifier, request));
        Ok(())
    }
}

pub(crate) struct ReceiveResponseAssembler {
    identifier: Uuid,
    stream_manager: StreamManager,
    buffer: Mutex<Vec<u8>>,
    on_completed: ReceiveResponseCallback,
}

impl ReceiveResponseAssembler {
    pub(crate) fn new(
        header: &Header,
        stream_manager: StreamManager,
        on_completed: ReceiveResponseCallback,
    ) -> Self {
        Self {
            identifier: header.id,
            stream_manager,
            buffer: Mutex::new(Vec::new()),
            on_completed,
        }
    }

    /// Accept one chunk of the response control payload.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as
    /// [`ReceiveRequestAssembler::on_receive`].
    pub(crate) fn on_receive(&self, header: &Header, chunk: &[u8]) -> Result<()> {
        let mut buffer = self.buffer.lock().expect("control payload buffer lock");
        buffer.extend_from_slice(chunk);
        if !header.end {
            return Ok(());
        }

        let body = std::mem::take(&mut *buffer);
        drop(buffer);

        let payload: ResponsePayload = serde_json::from_slice(models::strip_bom(&body))?;
        let streams = resolve_content_streams(&self.stream_manager, payload.streams)?;
        let response = ReceiveResponse {
            status_code: payload.status_code,
            streams,
        };

        tokio::spawn((self.on_completed)(self.identifier, response));
        Ok(())
    }
}
