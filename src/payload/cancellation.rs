//! Registry of streams the remote peer no longer wants.
//!
//! Receiving a cancel-stream frame marks its id here; receiving cancel-all
//! trips a connection-wide flag. The outbound writer consults the registry
//! before each content-stream frame and drops frames for cancelled ids,
//! which stops an in-progress transfer between chunks. Frames that were
//! already on the wire are tolerated by the peer's ignore-unknown-id rule.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashSet;
use uuid::Uuid;

/// Shared, connection-scoped set of cancelled outbound stream ids.
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    cancelled: Arc<DashSet<Uuid>>,
    all_cancelled: Arc<AtomicBool>,
}

impl CancellationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Mark a single stream as cancelled by the peer.
    pub fn cancel(&self, id: Uuid) { self.cancelled.insert(id); }

    /// Mark every stream on this connection as cancelled.
    pub fn cancel_all(&self) { self.all_cancelled.store(true, Ordering::Release); }

    /// Whether content frames for `id` should still be sent.
    #[must_use]
    pub fn is_cancelled(&self, id: Uuid) -> bool {
        self.all_cancelled.load(Ordering::Acquire) || self.cancelled.contains(&id)
    }
}

impl std::fmt::Debug for CancellationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationRegistry")
            .field("cancelled", &self.cancelled.len())
            .field("all_cancelled", &self.all_cancelled.load(Ordering::Acquire))
            .finish()
    }
}
