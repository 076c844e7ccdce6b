//! Payload assembly, disassembly, and correlation.
//!
//! Everything between the frame codec and the transport lives here: the
//! chunk queues logical streams are read from, the per-connection maps
//! routing interleaved frames to the right reconstruction state, the
//! disassemblers that cut outbound payloads into frames, and the pending
//! map that correlates requests with their responses.

pub mod assembler;
pub mod assembler_manager;
pub mod cancellation;
pub mod content_stream;
pub(crate) mod disassembler;
pub mod models;
pub(crate) mod receive_assembler;
pub mod request_manager;
pub mod send_operations;
pub mod stream;
pub mod stream_manager;

pub use assembler::PayloadStreamAssembler;
pub use assembler_manager::PayloadAssemblerManager;
pub use cancellation::CancellationRegistry;
pub use content_stream::ContentStream;
pub use models::{RequestPayload, ResponsePayload, StreamDescription};
pub use receive_assembler::{ReceiveRequestCallback, ReceiveResponseCallback};
pub use request_manager::{PendingResponse, RequestManager};
pub use send_operations::SendOperations;
pub use stream::PayloadStream;
pub use stream_manager::{CancelStreamCallback, StreamManager};

#[cfg(test)]
mod tests;
