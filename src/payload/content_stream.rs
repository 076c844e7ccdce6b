//! User-facing handle to one incoming content stream.
//!
//! A [`ContentStream`] pairs a stream id with its assembler so request and
//! response consumers can read the body lazily, after the surrounding
//! control payload has already been delivered. The assembler's lifecycle
//! stays with the stream manager; `cancel` asks the manager to close the
//! entry rather than tearing anything down directly.

use std::sync::Arc;

use uuid::Uuid;

use super::assembler::PayloadStreamAssembler;

/// Lazily readable handle to a logical stream's body bytes.
#[derive(Clone, Debug)]
pub struct ContentStream {
    id: Uuid,
    assembler: Arc<PayloadStreamAssembler>,
}

impl ContentStream {
    #[must_use]
    pub(crate) fn new(id: Uuid, assembler: Arc<PayloadStreamAssembler>) -> Self {
        Self { id, assembler }
    }

    /// Identifier of the underlying logical stream.
    #[must_use]
    pub fn id(&self) -> Uuid { self.id }

    /// MIME-like content type announced for this stream.
    #[must_use]
    pub fn content_type(&self) -> Option<String> { self.assembler.content_type() }

    /// Declared byte length of the stream's content, when announced.
    #[must_use]
    pub fn length(&self) -> Option<usize> { self.assembler.content_length() }

    /// Copy the next queued bytes into `buffer`, suspending until data
    /// arrives. Returns `0` at end of stream.
    pub async fn read(&self, buffer: &mut [u8]) -> usize {
        self.assembler.payload_stream().read(buffer).await
    }

    /// Drain the stream to completion and return the assembled bytes.
    pub async fn read_until_end(&self) -> Vec<u8> {
        self.assembler.payload_stream().read_until_end().await
    }

    /// Stop consuming this stream.
    ///
    /// Closing before the final frame arrived notifies the remote peer with
    /// a cancel-stream frame so it can stop emitting remaining chunks.
    pub fn cancel(&self) { self.assembler.close(); }
}
