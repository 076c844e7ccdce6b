#![doc(html_root_url = "https://docs.rs/weft/latest")]
//! Public API for the `weft` library.
//!
//! `weft` multiplexes concurrent request/response exchanges over a single
//! reliable byte transport. Either side of a connection can send requests
//! carrying one or more content streams and await the correlated response;
//! frames of unrelated streams interleave freely on the wire and are
//! demultiplexed by stream id on arrival.

pub mod adapter;
pub mod error;
/// Result type alias re-exported for convenience.
pub use error::Result;
pub use error::WeftError;
pub mod frame;
pub mod payload;
pub mod receive;
pub mod request;
pub mod response;
pub mod transport;

pub use adapter::{ProtocolAdapter, RequestHandler};
pub use frame::{Header, HeaderError, PayloadType};
pub use payload::{
    CancellationRegistry,
    ContentStream,
    PayloadAssemblerManager,
    PayloadStream,
    RequestManager,
    SendOperations,
    StreamManager,
};
pub use receive::{ReceiveRequest, ReceiveResponse};
pub use request::{MessageStream, StreamingRequest};
pub use response::StreamingResponse;
pub use transport::{
    DisconnectedEvent,
    PayloadReceiver,
    PayloadSender,
    StreamingConnection,
    TransportReceiver,
    TransportSender,
    web_socket::{WebSocketClient, WebSocketServer},
};
