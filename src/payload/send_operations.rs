//! Entry points for sending requests, responses, and cancellations.
//!
//! Each operation disassembles its payloads onto the sender's frame queue:
//! the control payload first, then every attached content stream under its
//! own id. Enqueueing never suspends; the sender's writer task drains the
//! queue in order.

use bytes::Bytes;
use uuid::Uuid;

use super::disassembler;
use crate::{
    error::Result,
    frame::{Header, PayloadType},
    request::StreamingRequest,
    response::StreamingResponse,
    transport::PayloadSender,
};

/// Send-side operations bound to one connection's sender.
#[derive(Clone, Debug)]
pub struct SendOperations {
    sender: PayloadSender,
}

impl SendOperations {
    /// Bind operations to `sender`.
    #[must_use]
    pub fn new(sender: PayloadSender) -> Self { Self { sender } }

    /// Disassemble and enqueue `request` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Json`] when the control payload fails to
    /// serialize, or [`crate::WeftError::Disconnected`] when the sender has
    /// stopped.
    pub fn send_request(&self, id: Uuid, request: &StreamingRequest) -> Result<()> {
        let control = disassembler::encode_request(request)?;
        disassembler::send_in_chunks(&self.sender, PayloadType::Request, id, &control)?;

        for stream in &request.streams {
            disassembler::send_in_chunks(
                &self.sender,
                PayloadType::Stream,
                stream.id,
                &stream.content,
            )?;
        }
        Ok(())
    }

    /// Disassemble and enqueue `response` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Json`] when the control payload fails to
    /// serialize, or [`crate::WeftError::Disconnected`] when the sender has
    /// stopped.
    pub fn send_response(&self, id: Uuid, response: &StreamingResponse) -> Result<()> {
        let control = disassembler::encode_response(response)?;
        disassembler::send_in_chunks(&self.sender, PayloadType::Response, id, &control)?;

        for stream in &response.streams {
            disassembler::send_in_chunks(
                &self.sender,
                PayloadType::Stream,
                stream.id,
                &stream.content,
            )?;
        }
        Ok(())
    }

    /// Tell the peer to stop emitting chunks for stream `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Disconnected`] when the sender has
    /// stopped.
    pub fn send_cancel_stream(&self, id: Uuid) -> Result<()> {
        self.sender.send_payload(
            Header::cancellation(PayloadType::CancelStream, id),
            Bytes::new(),
        )
    }

    /// Tell the peer to stop emitting chunks for every stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WeftError::Disconnected`] when the sender has
    /// stopped.
    pub fn send_cancel_all(&self, id: Uuid) -> Result<()> {
        self.sender.send_payload(
            Header::cancellation(PayloadType::CancelAll, id),
            Bytes::new(),
        )
    }
}
