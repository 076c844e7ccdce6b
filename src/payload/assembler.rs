//! Per-stream reconstruction state.
//!
//! A [`PayloadStreamAssembler`] exists for one logical stream id for the
//! duration of that stream's transfer: created lazily on the first frame
//! (or stream description) referencing the id, destroyed once the stream
//! is fully consumed or cancelled. It owns the backing [`PayloadStream`]
//! and tracks the declared content type/length and the end flag.

use std::sync::{
    Arc,
    Mutex,
    Weak,
    atomic::{AtomicBool, Ordering},
};

use uuid::Uuid;

use super::{stream::PayloadStream, stream_manager::StreamManagerInner};
use crate::frame::Header;

/// Stateful reconstructor for one logical stream.
pub struct PayloadStreamAssembler {
    identifier: Uuid,
    manager: Weak<StreamManagerInner>,
    stream: Arc<PayloadStream>,
    content_type: Mutex<Option<String>>,
    end: AtomicBool,
}

impl PayloadStreamAssembler {
    pub(crate) fn new(manager: Weak<StreamManagerInner>, identifier: Uuid) -> Self {
        Self {
            identifier,
            manager,
            stream: Arc::new(PayloadStream::new()),
            content_type: Mutex::new(None),
            end: AtomicBool::new(false),
        }
    }

    /// Identifier of the logical stream this assembler reconstructs.
    #[must_use]
    pub fn identifier(&self) -> Uuid { self.identifier }

    /// MIME-like content type declared for this stream, once known.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.content_type.lock().expect("content type lock").clone()
    }

    /// Declared content length, once known.
    #[must_use]
    pub fn content_length(&self) -> Option<usize> { self.stream.content_length() }

    /// Whether the final frame of this stream has been observed.
    #[must_use]
    pub fn end(&self) -> bool { self.end.load(Ordering::Acquire) }

    /// Backing stream used as the write target for incoming chunks.
    #[must_use]
    pub fn payload_stream(&self) -> Arc<PayloadStream> { Arc::clone(&self.stream) }

    /// Record the content type and length resolved from a stream description.
    ///
    /// Frames may arrive before the announcing control payload resolves;
    /// until then the assembler accepts chunks with both fields unknown.
    pub(crate) fn set_description(&self, content_type: Option<String>, length: Option<usize>) {
        *self.content_type.lock().expect("content type lock") = content_type;
        if let Some(length) = length {
            self.stream.set_content_length(length);
        }
    }

    /// Accept one frame chunk for this stream.
    pub(crate) fn on_receive(&self, header: &Header, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.stream.give_buffer(chunk);
        }
        if header.end {
            self.end.store(true, Ordering::Release);
            self.stream.done_producing();
        }
    }

    /// Remove this assembler from its manager, cancelling the stream if it
    /// was not complete.
    pub fn close(&self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.close_stream(self.identifier);
        }
    }
}

impl std::fmt::Debug for PayloadStreamAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadStreamAssembler")
            .field("identifier", &self.identifier)
            .field("content_type", &self.content_type())
            .field("content_length", &self.content_length())
            .field("end", &self.end())
            .finish_non_exhaustive()
    }
}
