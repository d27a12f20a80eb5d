//! MessagePack codec for Lighthouse request and response envelopes.
//!
//! Wire format: every message is a single MessagePack **map** keyed by short
//! upper-case strings.
//!
//! ```text
//! request:  { REID: int, VERB: str, PATH: [str], META: {str: str},
//!             AUTH: { USER: str, TOKEN: str }, PAYL: any }
//! response: { RNUM: int, REID: int, WARNINGS?: [str], RESPONSE?: str, PAYL?: any }
//! ```
//!
//! Decoding a response is forgiving: only `RNUM` and `REID` are
//! required.  Optional fields of the wrong type are treated as absent, and the
//! payload falls back to [`Payload::Empty`] when its shape is unknown.

use std::collections::BTreeMap;

use rmpv::Value;
use thiserror::Error;

use crate::domain::display::FrameError;
use crate::protocol::messages::{keys, Authentication, ClientMessage, ServerMessage, Verb};
use crate::protocol::payload::Payload;
use crate::protocol::value::{
    as_string_vec, map_get, require_i64, require_str, string_map, string_vec_value,
};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The buffer decoded to a MessagePack value other than a map.
    #[error("message is not a MessagePack map")]
    NotAMap,

    /// A required envelope field is absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A required envelope field is present but has the wrong type.
    #[error("field {field} must be a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// A frame buffer does not describe exactly one full display.
    #[error("invalid frame length: {len} bytes")]
    InvalidFrameLength { len: usize },

    /// The bytes are not valid MessagePack.
    #[error("malformed MessagePack: {0}")]
    Decode(String),

    /// Writing the MessagePack representation failed.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

impl From<FrameError> for ProtocolError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::InvalidLength { len } => ProtocolError::InvalidFrameLength { len },
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ClientMessage`] into MessagePack bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the underlying writer fails.
///
/// # Examples
///
/// ```rust
/// use lighthouse_core::{decode_client_message, encode_client_message};
/// use lighthouse_core::{Authentication, ClientMessage, Payload};
///
/// let msg = ClientMessage::new(0, "LIST", vec!["user".into()], Authentication::new("a", "t"), Payload::Empty);
/// let bytes = encode_client_message(&msg).unwrap();
/// assert_eq!(decode_client_message(&bytes).unwrap(), msg);
/// ```
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    let auth = string_map([
        (keys::USER, Value::from(msg.authentication.username.as_str())),
        (keys::TOKEN, Value::from(msg.authentication.token.as_str())),
    ]);
    let meta = Value::Map(
        msg.meta
            .iter()
            .map(|(k, v)| (Value::from(k.as_str()), Value::from(v.as_str())))
            .collect(),
    );
    let value = string_map([
        (keys::REQUEST_ID, Value::from(msg.request_id)),
        (keys::VERB, Value::from(msg.verb.as_str())),
        (keys::PATH, string_vec_value(&msg.path)),
        (keys::META, meta),
        (keys::AUTH, auth),
        (keys::PAYLOAD, msg.payload.encode()),
    ]);
    write(&value)
}

/// Decodes a [`ClientMessage`] from MessagePack bytes.
///
/// `REID`, `VERB` and `AUTH` are required; `PATH` and `META` default to empty
/// when absent or malformed.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are not a MessagePack map or a
/// required field is missing or has the wrong type.
pub fn decode_client_message(bytes: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let value = read(bytes)?;
    let map = value.as_map().ok_or(ProtocolError::NotAMap)?;

    let request_id = require_i64(map, keys::REQUEST_ID)?;
    let verb = Verb::new(require_str(map, keys::VERB)?);

    let auth = map_get(map, keys::AUTH).ok_or(ProtocolError::MissingField(keys::AUTH))?;
    let auth = auth.as_map().ok_or(ProtocolError::InvalidField {
        field: keys::AUTH,
        expected: "map",
    })?;
    let authentication = Authentication::new(
        require_str(auth, keys::USER)?,
        require_str(auth, keys::TOKEN)?,
    );

    let path = map_get(map, keys::PATH)
        .and_then(as_string_vec)
        .unwrap_or_default();
    let meta = map_get(map, keys::META)
        .and_then(Value::as_map)
        .map(|entries| decode_meta(entries))
        .unwrap_or_default();
    let payload = map_get(map, keys::PAYLOAD)
        .map(Payload::decode)
        .unwrap_or_default();

    Ok(ClientMessage {
        request_id,
        verb,
        path,
        meta,
        authentication,
        payload,
    })
}

/// Encodes a [`ServerMessage`] into MessagePack bytes.
///
/// `WARNINGS` and `RESPONSE` are only written when present.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the underlying writer fails.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut entries = vec![
        (keys::CODE, Value::from(msg.code)),
        (keys::REQUEST_ID, Value::from(msg.request_id)),
    ];
    if let Some(warnings) = &msg.warnings {
        entries.push((keys::WARNINGS, string_vec_value(warnings)));
    }
    if let Some(response) = &msg.response {
        entries.push((keys::RESPONSE, Value::from(response.as_str())));
    }
    entries.push((keys::PAYLOAD, msg.payload.encode()));
    write(&string_map(entries))
}

/// Decodes a [`ServerMessage`] from MessagePack bytes.
///
/// # Errors
///
/// Returns [`ProtocolError`] only if the bytes are not a MessagePack map, or
/// `RNUM`/`REID` is missing or not an integer.  An absent, malformed or
/// unrecognised payload decodes to [`Payload::Empty`].
pub fn decode_server_message(bytes: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let value = read(bytes)?;
    let map = value.as_map().ok_or(ProtocolError::NotAMap)?;

    let code = require_i64(map, keys::CODE)?;
    let request_id = require_i64(map, keys::REQUEST_ID)?;
    let warnings = map_get(map, keys::WARNINGS).and_then(as_string_vec);
    let response = map_get(map, keys::RESPONSE)
        .and_then(Value::as_str)
        .map(str::to_owned);
    let payload = map_get(map, keys::PAYLOAD)
        .map(Payload::decode)
        .unwrap_or_default();

    Ok(ServerMessage {
        code,
        request_id,
        warnings,
        response,
        payload,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn write(value: &Value) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value)
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Reads exactly one MessagePack value; trailing bytes are an error.
fn read(mut bytes: &[u8]) -> Result<Value, ProtocolError> {
    let value =
        rmpv::decode::read_value(&mut bytes).map_err(|e| ProtocolError::Decode(e.to_string()))?;
    if !bytes.is_empty() {
        return Err(ProtocolError::Decode(format!(
            "{} trailing bytes after message",
            bytes.len()
        )));
    }
    Ok(value)
}

/// Keeps string → string entries; anything else is skipped.
fn decode_meta(entries: &[(Value, Value)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter_map(|(k, v)| Some((k.as_str()?.to_owned(), v.as_str()?.to_owned())))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::display::{Color, Frame};
    use crate::domain::input::InputEvent;

    fn encode_value(value: Value) -> Vec<u8> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &value).unwrap();
        buf
    }

    fn sample_request() -> ClientMessage {
        ClientMessage::new(
            7,
            Verb::PUT,
            vec!["user".into(), "alice".into(), "model".into()],
            Authentication::new("alice", "tok"),
            Payload::Frame(Frame::fill(Color::RED)),
        )
    }

    #[test]
    fn test_client_message_round_trip() {
        // Arrange
        let mut msg = sample_request();
        msg.meta.insert("trace".into(), "abc".into());

        // Act
        let bytes = encode_client_message(&msg).unwrap();
        let decoded = decode_client_message(&bytes).unwrap();

        // Assert
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_client_message_wire_keys() {
        let bytes = encode_client_message(&sample_request()).unwrap();
        let value = rmpv::decode::read_value(&mut bytes.as_slice()).unwrap();
        let map = value.as_map().unwrap();

        assert_eq!(map_get(map, "REID"), Some(&Value::from(7)));
        assert_eq!(map_get(map, "VERB"), Some(&Value::from("PUT")));
        let auth = map_get(map, "AUTH").unwrap().as_map().unwrap();
        assert_eq!(map_get(auth, "USER"), Some(&Value::from("alice")));
        assert_eq!(map_get(auth, "TOKEN"), Some(&Value::from("tok")));
        assert!(matches!(map_get(map, "PAYL"), Some(Value::Binary(_))));
        assert!(map_get(map, "META").unwrap().as_map().unwrap().is_empty());
    }

    #[test]
    fn test_server_message_round_trip_with_optionals() {
        let msg = ServerMessage {
            code: 200,
            request_id: 3,
            warnings: Some(vec!["slow down".into()]),
            response: Some("OK".into()),
            payload: Payload::InputEvent(InputEvent::key(1, 38, true)),
        };

        let bytes = encode_server_message(&msg).unwrap();

        assert_eq!(decode_server_message(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_server_message_omits_absent_optionals() {
        let bytes = encode_server_message(&ServerMessage::ok(1)).unwrap();
        let value = rmpv::decode::read_value(&mut bytes.as_slice()).unwrap();
        let map = value.as_map().unwrap();

        assert!(map_get(map, "WARNINGS").is_none());
        assert!(map_get(map, "RESPONSE").is_none());
        assert_eq!(map_get(map, "PAYL"), Some(&Value::Nil));
    }

    #[test]
    fn test_server_decode_tolerates_missing_and_unknown_payload() {
        // Arrange
        let missing = encode_value(string_map([
            ("RNUM", Value::from(200)),
            ("REID", Value::from(4)),
        ]));
        let unknown = encode_value(string_map([
            ("RNUM", Value::from(200)),
            ("REID", Value::from(5)),
            ("PAYL", Value::from("something new")),
        ]));

        // Act
        let missing = decode_server_message(&missing).unwrap();
        let unknown = decode_server_message(&unknown).unwrap();

        // Assert
        assert_eq!(missing, ServerMessage::ok(4));
        assert_eq!(unknown, ServerMessage::ok(5));
    }

    #[test]
    fn test_server_decode_ignores_wrongly_typed_optionals() {
        let bytes = encode_value(string_map([
            ("RNUM", Value::from(404)),
            ("REID", Value::from(9)),
            ("WARNINGS", Value::from("not a list")),
            ("RESPONSE", Value::from(17)),
        ]));

        let msg = decode_server_message(&bytes).unwrap();

        assert_eq!(msg, ServerMessage::with_code(404, 9));
    }

    #[test]
    fn test_server_decode_requires_code_and_request_id() {
        let no_code = encode_value(string_map([("REID", Value::from(1))]));
        let no_reid = encode_value(string_map([("RNUM", Value::from(200))]));
        let bad_reid = encode_value(string_map([
            ("RNUM", Value::from(200)),
            ("REID", Value::from("one")),
        ]));

        assert_eq!(
            decode_server_message(&no_code),
            Err(ProtocolError::MissingField("RNUM"))
        );
        assert_eq!(
            decode_server_message(&no_reid),
            Err(ProtocolError::MissingField("REID"))
        );
        assert_eq!(
            decode_server_message(&bad_reid),
            Err(ProtocolError::InvalidField {
                field: "REID",
                expected: "integer"
            })
        );
    }

    #[test]
    fn test_decode_rejects_non_map_and_garbage() {
        let array = encode_value(Value::Array(vec![Value::from(200), Value::from(1)]));

        assert_eq!(decode_server_message(&array), Err(ProtocolError::NotAMap));
        assert!(matches!(
            decode_server_message(&[]),
            Err(ProtocolError::Decode(_))
        ));
        // fixmap header announcing one entry, then nothing.
        assert!(matches!(
            decode_server_message(&[0x81]),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        // Arrange
        let mut request = encode_client_message(&sample_request()).unwrap();
        request.extend_from_slice(&[0xc1, 0xff, 0xff]);
        let mut response = encode_server_message(&ServerMessage::ok(1)).unwrap();
        response.push(0xc0);

        // Act
        let request = decode_client_message(&request);
        let response = decode_server_message(&response);

        // Assert
        assert_eq!(
            request,
            Err(ProtocolError::Decode("3 trailing bytes after message".into()))
        );
        assert_eq!(
            response,
            Err(ProtocolError::Decode("1 trailing bytes after message".into()))
        );
    }

    #[test]
    fn test_client_decode_defaults_path_and_meta() {
        let bytes = encode_value(string_map([
            ("REID", Value::from(0)),
            ("VERB", Value::from("LIST")),
            (
                "AUTH",
                string_map([("USER", Value::from("u")), ("TOKEN", Value::from("t"))]),
            ),
        ]));

        let msg = decode_client_message(&bytes).unwrap();

        assert!(msg.path.is_empty());
        assert!(msg.meta.is_empty());
        assert_eq!(msg.payload, Payload::Empty);
        assert_eq!(msg.verb, "LIST");
    }

    #[test]
    fn test_client_decode_requires_auth() {
        let bytes = encode_value(string_map([
            ("REID", Value::from(0)),
            ("VERB", Value::from("GET")),
        ]));

        assert_eq!(
            decode_client_message(&bytes),
            Err(ProtocolError::MissingField("AUTH"))
        );
    }

    #[test]
    fn test_unknown_verb_survives_round_trip() {
        let msg = ClientMessage::new(
            1,
            "FOO",
            Vec::new(),
            Authentication::default(),
            Payload::Empty,
        );
        let decoded = decode_client_message(&encode_client_message(&msg).unwrap()).unwrap();
        assert_eq!(decoded.verb, "FOO");
    }

    #[test]
    fn test_frame_error_converts_to_protocol_error() {
        let err: ProtocolError = Frame::from_bytes(&[0u8; 4]).unwrap_err().into();
        assert_eq!(err, ProtocolError::InvalidFrameLength { len: 4 });
    }
}
