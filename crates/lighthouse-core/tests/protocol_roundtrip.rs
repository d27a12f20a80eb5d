//! Integration tests for the lighthouse-core envelope codec.
//!
//! These tests go through the public API only, exercising the envelopes, the
//! payload codec and the domain types together.

use lighthouse_core::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    Authentication, ClientMessage, Color, DirectoryTree, Entry, Frame, InputEvent, Payload,
    ProtocolError, ServerMessage, Verb, LIGHTHOUSE_SIZE,
};

fn roundtrip_client(msg: &ClientMessage) -> ClientMessage {
    let bytes = encode_client_message(msg).expect("encode must succeed");
    decode_client_message(&bytes).expect("decode must succeed")
}

fn roundtrip_server(msg: &ServerMessage) -> ServerMessage {
    let bytes = encode_server_message(msg).expect("encode must succeed");
    decode_server_message(&bytes).expect("decode must succeed")
}

fn auth() -> Authentication {
    Authentication::new("alice", "API-TOK_1234")
}

#[test]
fn test_roundtrip_every_well_known_verb() {
    for (i, verb) in Verb::WELL_KNOWN.iter().enumerate() {
        let original = ClientMessage::new(
            i as i64,
            *verb,
            vec!["user".into(), "alice".into(), "model".into()],
            auth(),
            Payload::Empty,
        );

        assert_eq!(roundtrip_client(&original), original, "verb {verb}");
    }
}

#[test]
fn test_roundtrip_link_carries_source_path_as_payload() {
    let original = ClientMessage::new(
        4,
        Verb::LINK,
        vec!["user".into(), "alice".into(), "model".into()],
        auth(),
        Payload::Path(vec!["user".into(), "bob".into(), "model".into()]),
    );

    assert_eq!(roundtrip_client(&original), original);
}

#[test]
fn test_roundtrip_every_payload_shape_in_responses() {
    let payloads = [
        Payload::Frame(Frame::fill(Color::CYAN)),
        Payload::InputEvent(InputEvent::button(3, 12, false)),
        Payload::DirectoryTree(
            DirectoryTree::new().with(
                "user",
                DirectoryTree::new().with("alice", DirectoryTree::new().with("model", Entry::Resource)),
            ),
        ),
        Payload::Path(vec!["a".into()]),
        Payload::Empty,
    ];

    for payload in payloads {
        let original = ServerMessage::ok(11).with_payload(payload);
        assert_eq!(roundtrip_server(&original), original);
    }
}

#[test]
fn test_roundtrip_error_response_keeps_message() {
    let original = ServerMessage::with_code(401, 2).with_response("Unauthorized");

    let decoded = roundtrip_server(&original);

    let err = decoded.check().unwrap_err();
    assert_eq!(err.code, 401);
    assert_eq!(err.message.as_deref(), Some("Unauthorized"));
}

#[test]
fn test_full_frame_is_768_bytes_on_the_wire() {
    let frame = Frame::default();
    assert_eq!(frame.to_bytes().len(), 768);
    assert_eq!(frame.pixels().len(), LIGHTHOUSE_SIZE);
}

#[test]
fn test_client_bytes_are_not_a_server_message() {
    // A request has REID but no RNUM.
    let bytes = encode_client_message(&ClientMessage::new(
        0,
        Verb::GET,
        Vec::new(),
        auth(),
        Payload::Empty,
    ))
    .unwrap();

    assert_eq!(
        decode_server_message(&bytes),
        Err(ProtocolError::MissingField("RNUM"))
    );
}
