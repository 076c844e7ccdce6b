//! Correlation of outbound requests with their eventual responses.
//!
//! Each in-flight request registers a pending entry keyed by its request
//! id. When a fully assembled response arrives carrying that id, the
//! waiter is resolved; when the connection drops first, every waiter is
//! failed so callers never hang on a dead connection.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{
    error::{Result, WeftError},
    receive::ReceiveResponse,
};

type PendingMap = Arc<DashMap<Uuid, oneshot::Sender<ReceiveResponse>>>;

/// Pending-response map for one connection.
#[derive(Clone, Default)]
pub struct RequestManager {
    pending: PendingMap,
}

impl RequestManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register interest in the response for `request_id`.
    ///
    /// Registration is synchronous: once this returns, a response arriving
    /// on another task will find the waiter. The returned handle resolves
    /// when the response is signalled and removes the pending entry when
    /// dropped, so abandoned waits leave nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::PendingResponse`] if a wait is already
    /// registered for this id; only one waiter per id is meaningful.
    pub fn register(&self, request_id: Uuid) -> Result<PendingResponse> {
        let (sender, receiver) = oneshot::channel();
        match self.pending.entry(request_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(WeftError::PendingResponse(request_id));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(sender);
            }
        }

        Ok(PendingResponse {
            request_id,
            receiver: Some(receiver),
            pending: Arc::clone(&self.pending),
        })
    }

    /// Await the response correlated with `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::PendingResponse`] when another wait is already
    /// registered for this id, or [`WeftError::Disconnected`] when the
    /// connection drops before a response arrives.
    pub async fn get_response(&self, request_id: Uuid) -> Result<ReceiveResponse> {
        self.register(request_id)?.await_response().await
    }

    /// Resolve the pending wait for `request_id`, if one exists.
    ///
    /// Returns whether a waiter was found. A response with no waiter is not
    /// an error; the requester may have timed out and walked away.
    pub fn signal_response(&self, request_id: Uuid, response: ReceiveResponse) -> bool {
        match self.pending.remove(&request_id) {
            Some((_, sender)) => {
                // a send failure means the waiter gave up in the meantime
                let _ = sender.send(response);
                true
            }
            None => false,
        }
    }

    /// Fail every pending wait because the connection dropped.
    pub fn fail_all_pending(&self) {
        // dropping the senders wakes each waiter with a disconnect error
        self.pending.clear();
    }

    /// Number of requests currently awaiting a response.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }
}

impl std::fmt::Debug for RequestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestManager")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Registered wait for one correlated response.
pub struct PendingResponse {
    request_id: Uuid,
    receiver: Option<oneshot::Receiver<ReceiveResponse>>,
    pending: PendingMap,
}

impl PendingResponse {
    /// Suspend until the correlated response is signalled.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Disconnected`] when the pending entry was torn
    /// down before a response arrived.
    pub async fn await_response(mut self) -> Result<ReceiveResponse> {
        let receiver = self.receiver.take().expect("await_response called once");
        receiver.await.map_err(|_| {
            WeftError::Disconnected(format!(
                "connection dropped before a response arrived for request {}",
                self.request_id
            ))
        })
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        // no-op when the wait was resolved: signalling removed the entry
        self.pending.remove(&self.request_id);
    }
}
