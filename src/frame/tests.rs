//! Unit tests for the frame header codec.

use rstest::rstest;
use uuid::Uuid;

use super::{
    HEADER_LENGTH,
    Header,
    HeaderError,
    MAX_STREAM_LENGTH,
    PayloadType,
    codec,
};

fn sample_id() -> Uuid {
    Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid uuid")
}

#[test]
fn serializes_known_vector() {
    let header = Header::new(PayloadType::Request, 42, sample_id(), false);

    let buffer = codec::serialize(&header).expect("length within bounds");

    assert_eq!(
        buffer.as_slice(),
        b"A.000042.3fa85f64-5717-4562-b3fc-2c963f66afa6.0\n".as_slice()
    );
}

#[test]
fn deserializes_known_vector() {
    let wire = b"B.000168.3fa85f64-5717-4562-b3fc-2c963f66afa6.1\n";

    let header = codec::deserialize(wire).expect("well-formed header");

    assert_eq!(header.payload_type, PayloadType::Response);
    assert_eq!(header.payload_length, 168);
    assert_eq!(header.id, sample_id());
    assert!(header.end);
}

#[rstest]
#[case(PayloadType::Request, 0, false)]
#[case(PayloadType::Response, 1, true)]
#[case(PayloadType::Stream, 4096, false)]
#[case(PayloadType::CancelAll, 0, true)]
#[case(PayloadType::CancelStream, MAX_STREAM_LENGTH, true)]
fn round_trips_every_type(
    #[case] payload_type: PayloadType,
    #[case] payload_length: usize,
    #[case] end: bool,
) {
    let header = Header::new(payload_type, payload_length, Uuid::new_v4(), end);

    let buffer = codec::serialize(&header).expect("length within bounds");
    let decoded = codec::deserialize(&buffer).expect("serialized headers decode");

    assert_eq!(decoded, header);
}

#[test]
fn serialize_rejects_oversized_length() {
    let header = Header::new(PayloadType::Stream, MAX_STREAM_LENGTH + 1, sample_id(), false);

    assert_eq!(
        codec::serialize(&header),
        Err(HeaderError::PayloadLengthRange {
            actual: MAX_STREAM_LENGTH + 1
        })
    );
}

#[rstest]
#[case(5)]
#[case(HEADER_LENGTH - 1)]
#[case(HEADER_LENGTH + 7)]
fn deserialize_rejects_wrong_buffer_length(#[case] length: usize) {
    let wire = vec![b'0'; length];

    assert_eq!(
        codec::deserialize(&wire),
        Err(HeaderError::BufferLength { actual: length })
    );
}

#[test]
fn deserialize_rejects_unknown_type_tag() {
    let wire = b"Z.000168.3fa85f64-5717-4562-b3fc-2c963f66afa6.1\n";

    assert_eq!(codec::deserialize(wire), Err(HeaderError::UnknownType(b'Z')));
}

#[rstest]
#[case(1, *b"Ax000168.3fa85f64-5717-4562-b3fc-2c963f66afa6.1\n")]
#[case(8, *b"A.000168x3fa85f64-5717-4562-b3fc-2c963f66afa6.1\n")]
#[case(45, *b"A.000168.3fa85f64-5717-4562-b3fc-2c963f66afa6x1\n")]
fn deserialize_rejects_malformed_delimiters(
    #[case] offset: usize,
    #[case] wire: [u8; HEADER_LENGTH],
) {
    assert_eq!(
        codec::deserialize(&wire),
        Err(HeaderError::Delimiter { offset, actual: b'x' })
    );
}

#[test]
fn deserialize_rejects_non_decimal_length() {
    let wire = b"A.00c168.3fa85f64-5717-4562-b3fc-2c963f66afa6.1\n";

    assert_eq!(codec::deserialize(wire), Err(HeaderError::PayloadLength));
}

#[test]
fn deserialize_rejects_malformed_id() {
    let wire = b"A.000168.3fa85f64-5717-4562-b3fc-2c963f66afag.1\n";

    assert_eq!(codec::deserialize(wire), Err(HeaderError::StreamId));
}

#[test]
fn deserialize_rejects_malformed_end_flag() {
    let wire = b"A.000168.3fa85f64-5717-4562-b3fc-2c963f66afa6.2\n";

    assert_eq!(codec::deserialize(wire), Err(HeaderError::EndFlag(b'2')));
}

#[test]
fn deserialize_rejects_malformed_terminator() {
    let wire = b"A.000168.3fa85f64-5717-4562-b3fc-2c963f66afa6.1x";

    assert_eq!(codec::deserialize(wire), Err(HeaderError::Terminator(b'x')));
}
