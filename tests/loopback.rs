//! End-to-end exchanges over an in-memory loopback transport.
//!
//! Two fully wired connections talk to each other through a duplex pipe,
//! exercising disassembly, frame interleaving, demultiplexing, correlation,
//! and disconnect propagation without a real socket.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use weft::{
    ReceiveRequest,
    RequestHandler,
    StreamingConnection,
    StreamingRequest,
    StreamingResponse,
    WeftError,
};

use common::transport_pair;

/// Handler that answers 200 with the request body echoed back.
struct EchoHandler;

#[async_trait]
impl RequestHandler for EchoHandler {
    async fn process_request(&self, request: ReceiveRequest) -> weft::Result<StreamingResponse> {
        let body = request.read_body().await;
        let mut response = StreamingResponse::create_response(200, None);
        if !body.is_empty() {
            response.set_body(Bytes::from(body));
        }
        Ok(response)
    }
}

/// Handler that answers with the verb and path it saw.
struct DescribeHandler;

#[async_trait]
impl RequestHandler for DescribeHandler {
    async fn process_request(&self, request: ReceiveRequest) -> weft::Result<StreamingResponse> {
        let mut response = StreamingResponse::create_response(200, None);
        response.set_body(Bytes::from(format!("{} {}", request.verb, request.path)));
        Ok(response)
    }
}

/// Handler that concatenates every announced stream in order.
struct ConcatHandler;

#[async_trait]
impl RequestHandler for ConcatHandler {
    async fn process_request(&self, request: ReceiveRequest) -> weft::Result<StreamingResponse> {
        let mut combined = Vec::new();
        for stream in &request.streams {
            combined.extend_from_slice(&stream.read_until_end().await);
        }
        let mut response = StreamingResponse::create_response(200, None);
        response.set_body(Bytes::from(combined));
        Ok(response)
    }
}

/// Handler that never answers.
struct SilentHandler;

#[async_trait]
impl RequestHandler for SilentHandler {
    async fn process_request(&self, _request: ReceiveRequest) -> weft::Result<StreamingResponse> {
        Err(WeftError::InvalidState("this handler never answers"))
    }
}

/// Wire both peers and run their receive loops in the background.
fn connected_pair(
    server_handler: Arc<dyn RequestHandler>,
) -> (Arc<StreamingConnection>, Arc<StreamingConnection>) {
    let (client_transport, server_transport) = transport_pair();

    let client = Arc::new(StreamingConnection::new(
        client_transport.0,
        client_transport.1,
        Arc::new(EchoHandler),
    ));
    let server = Arc::new(StreamingConnection::new(
        server_transport.0,
        server_transport.1,
        server_handler,
    ));

    tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.start().await }
    });
    tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.start().await }
    });

    (client, server)
}

#[tokio::test]
async fn post_round_trips_an_echoed_body() {
    let (client, _server) = connected_pair(Arc::new(EchoHandler));

    let request =
        StreamingRequest::create_post("/path", Some(Bytes::from_static(b"{\"a\":1}")));
    let response = client.send(&request).await.expect("response arrives");

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.read_body_as_str().await.expect("utf-8 body"),
        "{\"a\":1}"
    );
}

#[tokio::test]
async fn get_without_body_round_trips() {
    let (client, _server) = connected_pair(Arc::new(DescribeHandler));

    let request = StreamingRequest::create_get("/health", None);
    let response = client.send(&request).await.expect("response arrives");

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.read_body_as_str().await.expect("utf-8 body"),
        "GET /health"
    );
}

#[tokio::test]
async fn concurrent_requests_resolve_to_their_own_responses() {
    let (client, _server) = connected_pair(Arc::new(DescribeHandler));

    let first_req = StreamingRequest::create_get("/first", None);
    let second_req = StreamingRequest::create_put("/second", None);
    let first = client.send(&first_req);
    let second = client.send(&second_req);
    let (first, second) = tokio::join!(first, second);

    assert_eq!(
        first
            .expect("first response")
            .read_body_as_str()
            .await
            .expect("utf-8 body"),
        "GET /first"
    );
    assert_eq!(
        second
            .expect("second response")
            .read_body_as_str()
            .await
            .expect("utf-8 body"),
        "PUT /second"
    );
}

#[tokio::test]
async fn body_larger_than_one_frame_round_trips() {
    let (client, _server) = connected_pair(Arc::new(EchoHandler));

    let body: Vec<u8> = (0..20_000_u32).map(|n| u8::try_from(n % 251).unwrap()).collect();
    let request = StreamingRequest::create_post("/large", Some(Bytes::from(body.clone())));
    let response = client.send(&request).await.expect("response arrives");

    assert_eq!(response.read_body().await, body);
}

#[tokio::test]
async fn multiple_streams_arrive_in_announced_order() {
    let (client, _server) = connected_pair(Arc::new(ConcatHandler));

    let mut request = StreamingRequest::create_post("/multi", None);
    request.add_stream(Bytes::from_static(b"one,"));
    request.add_stream(Bytes::from_static(b"two,"));
    request.add_stream(Bytes::from_static(b"three"));
    let response = client.send(&request).await.expect("response arrives");

    assert_eq!(
        response.read_body_as_str().await.expect("utf-8 body"),
        "one,two,three"
    );
}

#[tokio::test]
async fn both_sides_can_originate_requests() {
    let (client, server) = connected_pair(Arc::new(DescribeHandler));

    // the client wired in connected_pair answers with an echo
    let request =
        StreamingRequest::create_post("/from-server", Some(Bytes::from_static(b"reverse")));
    let response = server.send(&request).await.expect("response arrives");

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.read_body_as_str().await.expect("utf-8 body"),
        "reverse"
    );

    let response = client
        .send(&StreamingRequest::create_get("/from-client", None))
        .await
        .expect("response arrives");
    assert_eq!(
        response.read_body_as_str().await.expect("utf-8 body"),
        "GET /from-client"
    );
}

#[tokio::test]
async fn disconnect_fails_pending_requests() {
    let (client, server) = connected_pair(Arc::new(SilentHandler));

    let pending = tokio::spawn({
        let client = Arc::clone(&client);
        async move {
            client
                .send(&StreamingRequest::create_get("/never-answered", None))
                .await
        }
    });

    // let the request reach the silent peer, then drop the connection
    tokio::task::yield_now().await;
    server.disconnect();

    let outcome = pending.await.expect("send task");
    assert!(matches!(outcome, Err(WeftError::Disconnected(_))));
}
