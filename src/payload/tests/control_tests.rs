//! Tests for the top-level demultiplexer and control payload handling.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    frame::{Header, PayloadType},
    payload::{
        CancellationRegistry,
        PayloadAssemblerManager,
        ReceiveRequestCallback,
        ReceiveResponseCallback,
        RequestPayload,
        ResponsePayload,
        StreamDescription,
        StreamManager,
        disassembler,
    },
    receive::{ReceiveRequest, ReceiveResponse},
    request::MessageStream,
};

struct Harness {
    manager: PayloadAssemblerManager,
    cancellations: CancellationRegistry,
    requests: mpsc::UnboundedReceiver<(Uuid, ReceiveRequest)>,
    responses: mpsc::UnboundedReceiver<(Uuid, ReceiveResponse)>,
}

fn harness() -> Harness {
    let (request_tx, requests) = mpsc::unbounded_channel();
    let (response_tx, responses) = mpsc::unbounded_channel();

    let on_request: ReceiveRequestCallback = Arc::new(move |id, request| {
        let request_tx = request_tx.clone();
        Box::pin(async move {
            let _ = request_tx.send((id, request));
        })
    });
    let on_response: ReceiveResponseCallback = Arc::new(move |id, response| {
        let response_tx = response_tx.clone();
        Box::pin(async move {
            let _ = response_tx.send((id, response));
        })
    });

    let cancellations = CancellationRegistry::new();
    let manager = PayloadAssemblerManager::new(
        StreamManager::detached(),
        cancellations.clone(),
        on_request,
        on_response,
    );

    Harness {
        manager,
        cancellations,
        requests,
        responses,
    }
}

fn feed(manager: &PayloadAssemblerManager, header: &Header, chunk: &[u8]) {
    manager.ensure_assembler(header);
    manager
        .on_receive(header, chunk.to_vec())
        .expect("well-formed frame");
}

#[tokio::test]
async fn assembles_a_request_split_across_frames() {
    let mut harness = harness();
    let control_id = Uuid::new_v4();
    let stream_id = Uuid::new_v4();

    let body = serde_json::to_vec(&RequestPayload {
        verb: "POST".to_string(),
        path: Some("/api/messages".to_string()),
        streams: vec![StreamDescription {
            id: stream_id.to_string(),
            content_type: Some("application/json".to_string()),
            length: Some(7),
        }],
    })
    .expect("payload serializes");

    let (first, second) = body.split_at(body.len() / 2);
    feed(
        &harness.manager,
        &Header::new(PayloadType::Request, first.len(), control_id, false),
        first,
    );
    feed(
        &harness.manager,
        &Header::new(PayloadType::Request, second.len(), control_id, true),
        second,
    );

    let (id, request) = harness.requests.recv().await.expect("request delivered");
    assert_eq!(id, control_id);
    assert_eq!(request.verb, "POST");
    assert_eq!(request.path, "/api/messages");
    assert_eq!(request.streams.len(), 1);
    assert_eq!(request.streams[0].id(), stream_id);
    assert_eq!(request.streams[0].length(), Some(7));

    // content for the announced stream arrives after the control payload
    feed(
        &harness.manager,
        &Header::new(PayloadType::Stream, 7, stream_id, true),
        b"{\"a\":1}",
    );
    assert_eq!(request.streams[0].read_until_end().await, b"{\"a\":1}");
}

#[tokio::test]
async fn assembles_a_response_with_status_code() {
    let mut harness = harness();
    let control_id = Uuid::new_v4();

    let body = br#"{"statusCode":404}"#;
    feed(
        &harness.manager,
        &Header::new(PayloadType::Response, body.len(), control_id, true),
        body,
    );

    let (id, response) = harness.responses.recv().await.expect("response delivered");
    assert_eq!(id, control_id);
    assert_eq!(response.status_code, 404);
    assert!(response.streams.is_empty());
}

#[tokio::test]
async fn tolerates_content_frames_arriving_before_the_control_payload() {
    let mut harness = harness();
    let control_id = Uuid::new_v4();
    let stream_id = Uuid::new_v4();

    // network reordering: the content chunk lands first
    feed(
        &harness.manager,
        &Header::new(PayloadType::Stream, 5, stream_id, true),
        b"early",
    );

    let body = serde_json::to_vec(&RequestPayload {
        verb: "POST".to_string(),
        path: Some("/reordered".to_string()),
        streams: vec![StreamDescription {
            id: stream_id.to_string(),
            content_type: Some("text/plain".to_string()),
            length: Some(5),
        }],
    })
    .expect("payload serializes");
    feed(
        &harness.manager,
        &Header::new(PayloadType::Request, body.len(), control_id, true),
        &body,
    );

    let (_, request) = harness.requests.recv().await.expect("request delivered");
    assert_eq!(request.streams[0].read_until_end().await, b"early");
}

#[tokio::test]
async fn demultiplexes_interleaved_streams() {
    let mut harness = harness();
    let control_id = Uuid::new_v4();
    let first_id = Uuid::new_v4();
    let second_id = Uuid::new_v4();

    let body = serde_json::to_vec(&RequestPayload {
        verb: "POST".to_string(),
        path: Some("/interleaved".to_string()),
        streams: vec![
            StreamDescription {
                id: first_id.to_string(),
                content_type: Some("text/plain".to_string()),
                length: Some(6),
            },
            StreamDescription {
                id: second_id.to_string(),
                content_type: Some("text/plain".to_string()),
                length: Some(4),
            },
        ],
    })
    .expect("payload serializes");
    feed(
        &harness.manager,
        &Header::new(PayloadType::Request, body.len(), control_id, true),
        &body,
    );

    // frames of the two streams interleave arbitrarily
    feed(&harness.manager, &Header::new(PayloadType::Stream, 2, first_id, false), b"aa");
    feed(&harness.manager, &Header::new(PayloadType::Stream, 2, second_id, false), b"xx");
    feed(&harness.manager, &Header::new(PayloadType::Stream, 2, first_id, false), b"bb");
    feed(&harness.manager, &Header::new(PayloadType::Stream, 2, second_id, true), b"yy");
    feed(&harness.manager, &Header::new(PayloadType::Stream, 2, first_id, true), b"cc");

    let (_, request) = harness.requests.recv().await.expect("request delivered");
    assert_eq!(request.streams[0].read_until_end().await, b"aabbcc");
    assert_eq!(request.streams[1].read_until_end().await, b"xxyy");
}

#[tokio::test]
async fn control_payload_with_byte_order_mark_still_parses() {
    let mut harness = harness();
    let control_id = Uuid::new_v4();

    let mut body = b"\xef\xbb\xbf".to_vec();
    body.extend_from_slice(br#"{"verb":"GET","path":"/bom"}"#);
    feed(
        &harness.manager,
        &Header::new(PayloadType::Request, body.len(), control_id, true),
        &body,
    );

    let (_, request) = harness.requests.recv().await.expect("request delivered");
    assert_eq!(request.verb, "GET");
    assert_eq!(request.path, "/bom");
}

#[tokio::test]
async fn malformed_control_payload_is_a_protocol_violation() {
    let harness = harness();
    let control_id = Uuid::new_v4();
    let header = Header::new(PayloadType::Request, 8, control_id, true);

    harness.manager.ensure_assembler(&header);
    let outcome = harness.manager.on_receive(&header, b"not json".to_vec());

    assert!(outcome.is_err());
}

#[tokio::test]
async fn cancel_frames_mark_the_registry() {
    let harness = harness();
    let cancelled_id = Uuid::new_v4();
    let other_id = Uuid::new_v4();

    feed(
        &harness.manager,
        &Header::cancellation(PayloadType::CancelStream, cancelled_id),
        &[],
    );
    assert!(harness.cancellations.is_cancelled(cancelled_id));
    assert!(!harness.cancellations.is_cancelled(other_id));

    feed(
        &harness.manager,
        &Header::cancellation(PayloadType::CancelAll, Uuid::new_v4()),
        &[],
    );
    assert!(harness.cancellations.is_cancelled(other_id));
}

#[test]
fn request_payload_uses_wire_field_names() {
    let payload = RequestPayload {
        verb: "POST".to_string(),
        path: Some("/p".to_string()),
        streams: vec![StreamDescription {
            id: "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string(),
            content_type: Some("text/plain".to_string()),
            length: Some(3),
        }],
    };

    let encoded = serde_json::to_string(&payload).expect("payload serializes");

    assert_eq!(
        encoded,
        r#"{"verb":"POST","path":"/p","streams":[{"id":"3fa85f64-5717-4562-b3fc-2c963f66afa6","type":"text/plain","length":3}]}"#
    );
}

#[test]
fn response_payload_uses_camel_case_status() {
    let payload = ResponsePayload {
        status_code: 200,
        streams: Vec::new(),
    };

    assert_eq!(
        serde_json::to_string(&payload).expect("payload serializes"),
        r#"{"statusCode":200}"#
    );
}

#[test]
fn stream_descriptions_sniff_content_type() {
    let json_stream = MessageStream::new(b"{\"a\":1}".to_vec().into());
    let text_stream = MessageStream::new(b"plain words".to_vec().into());

    assert_eq!(
        disassembler::describe_stream(&json_stream).content_type.as_deref(),
        Some("application/json")
    );
    assert_eq!(
        disassembler::describe_stream(&text_stream).content_type.as_deref(),
        Some("text/plain")
    );
}
