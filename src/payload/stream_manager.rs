//! Connection-scoped registry of active stream assemblers.
//!
//! The manager is the sole owner of per-stream reconstruction state, keyed
//! by stream id. It is constructed at connection establishment and torn
//! down at disconnect, so no state leaks across connections. Frames for
//! unknown or already-closed ids are dropped silently: cancellation can
//! race with in-flight frames.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{assembler::PayloadStreamAssembler, stream::PayloadStream};
use crate::frame::Header;

/// Callback invoked when a stream is closed before it completed.
pub type CancelStreamCallback = Box<dyn Fn(&PayloadStreamAssembler) + Send + Sync>;

pub(crate) struct StreamManagerInner {
    active_assemblers: DashMap<Uuid, Arc<PayloadStreamAssembler>>,
    on_cancel_stream: Option<CancelStreamCallback>,
}

impl StreamManagerInner {
    pub(crate) fn close_stream(&self, identifier: Uuid) {
        let Some((_, assembler)) = self.active_assemblers.remove(&identifier) else {
            return;
        };

        let short_of_declared = assembler
            .content_length()
            .is_some_and(|length| assembler.payload_stream().producer_length() < length);

        if short_of_declared || !assembler.end() {
            debug!(stream = %identifier, "stream closed before completion");
            if let Some(on_cancel_stream) = &self.on_cancel_stream {
                on_cancel_stream(&assembler);
            }
        }
    }
}

/// Owner of the active-assembler map for one connection.
#[derive(Clone)]
pub struct StreamManager {
    inner: Arc<StreamManagerInner>,
}

impl StreamManager {
    /// Create a manager that reports premature stream closures through
    /// `on_cancel_stream`.
    #[must_use]
    pub fn new(on_cancel_stream: CancelStreamCallback) -> Self {
        Self::build(Some(on_cancel_stream))
    }

    /// Create a manager with no cancellation callback.
    #[must_use]
    pub fn detached() -> Self { Self::build(None) }

    fn build(on_cancel_stream: Option<CancelStreamCallback>) -> Self {
        Self {
            inner: Arc::new(StreamManagerInner {
                active_assemblers: DashMap::new(),
                on_cancel_stream,
            }),
        }
    }

    /// Resolve the assembler for `identifier`, creating one if absent.
    #[must_use]
    pub fn get_payload_assembler(&self, identifier: Uuid) -> Arc<PayloadStreamAssembler> {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .active_assemblers
            .entry(identifier)
            .or_insert_with(|| Arc::new(PayloadStreamAssembler::new(weak, identifier)))
            .clone()
    }

    /// Resolve (creating if needed) the backing stream for a frame's id.
    ///
    /// Used by the receiver as the write target for the frame's chunk, and
    /// to speculatively register streams whose content arrives before the
    /// announcing control payload resolves.
    #[must_use]
    pub fn get_payload_stream(&self, header: &Header) -> Arc<PayloadStream> {
        self.get_payload_assembler(header.id).payload_stream()
    }

    /// Route one frame chunk to the assembler for `header.id`, if one exists.
    pub fn on_receive(&self, header: &Header, chunk: Vec<u8>) {
        match self.inner.active_assemblers.get(&header.id) {
            Some(assembler) => assembler.on_receive(header, chunk),
            None => debug!(stream = %header.id, "dropping frame for unknown stream"),
        }
    }

    /// Remove the assembler for `identifier`, signalling cancellation when
    /// the stream had not completed.
    pub fn close_stream(&self, identifier: Uuid) { self.inner.close_stream(identifier); }

    /// Tear down every active assembler, waking any suspended readers.
    ///
    /// Used at disconnect; no cancellation frames are emitted because the
    /// connection is already gone.
    pub fn close_all(&self) {
        let identifiers: Vec<Uuid> = self
            .inner
            .active_assemblers
            .iter()
            .map(|entry| *entry.key())
            .collect();
        for identifier in identifiers {
            if let Some((_, assembler)) = self.inner.active_assemblers.remove(&identifier) {
                assembler.payload_stream().close();
            }
        }
    }

    /// Number of streams currently being assembled.
    #[must_use]
    pub fn active_len(&self) -> usize { self.inner.active_assemblers.len() }
}

impl std::fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamManager")
            .field("active_assemblers", &self.inner.active_assemblers.len())
            .finish()
    }
}
