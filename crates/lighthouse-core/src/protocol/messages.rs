//! Lighthouse request and response envelopes.
//!
//! Messages follow the wire layout described in [`crate::protocol::codec`]:
//! a MessagePack map keyed by short upper-case field names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::payload::Payload;

// ── Wire keys ─────────────────────────────────────────────────────────────────

/// Map keys used on the wire.
pub mod keys {
    pub const REQUEST_ID: &str = "REID";
    pub const VERB: &str = "VERB";
    pub const PATH: &str = "PATH";
    pub const META: &str = "META";
    pub const AUTH: &str = "AUTH";
    pub const USER: &str = "USER";
    pub const TOKEN: &str = "TOKEN";
    pub const PAYLOAD: &str = "PAYL";
    pub const CODE: &str = "RNUM";
    pub const WARNINGS: &str = "WARNINGS";
    pub const RESPONSE: &str = "RESPONSE";
}

/// The status code of a successful response.
pub const CODE_OK: i64 = 200;

/// The status code the reference server uses for unrecognised verbs.
pub const CODE_BAD_REQUEST: i64 = 400;

// ── Verb ──────────────────────────────────────────────────────────────────────

/// A request method.
///
/// This is an open set: the well-known methods are provided as constants, but
/// any string can be sent (the server rejects ones it does not know).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Verb(String);

impl Verb {
    /// Creates and updates a resource, effectively combining `PUT` and `CREATE`.
    pub const POST: &'static str = "POST";
    /// Creates a resource.
    pub const CREATE: &'static str = "CREATE";
    /// Creates a directory.
    pub const MKDIR: &'static str = "MKDIR";
    /// Deletes a resource.
    pub const DELETE: &'static str = "DELETE";
    /// Lists the contents of a directory.
    pub const LIST: &'static str = "LIST";
    /// Fetches a resource.
    pub const GET: &'static str = "GET";
    /// Updates a resource.
    pub const PUT: &'static str = "PUT";
    /// Opens a stream to a resource.
    pub const STREAM: &'static str = "STREAM";
    /// Stops a stream to a resource.
    pub const STOP: &'static str = "STOP";
    /// Creates a link between resources.
    pub const LINK: &'static str = "LINK";
    /// Removes a link between resources.
    pub const UNLINK: &'static str = "UNLINK";

    /// Every well-known method, in declaration order.
    pub const WELL_KNOWN: [&'static str; 11] = [
        Self::POST,
        Self::CREATE,
        Self::MKDIR,
        Self::DELETE,
        Self::LIST,
        Self::GET,
        Self::PUT,
        Self::STREAM,
        Self::STOP,
        Self::LINK,
        Self::UNLINK,
    ];

    /// Creates a verb from the raw method name.  Must generally be uppercase.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is one of the [`WELL_KNOWN`](Self::WELL_KNOWN) methods.
    pub fn is_well_known(&self) -> bool {
        Self::WELL_KNOWN.contains(&self.0.as_str())
    }

    /// Returns `true` for `STREAM`, the only verb with an open-ended response.
    pub fn is_stream(&self) -> bool {
        self.0 == Self::STREAM
    }
}

impl From<&str> for Verb {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Verb {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl PartialEq<&str> for Verb {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Authentication ────────────────────────────────────────────────────────────

/// The credentials used to authenticate with the lighthouse.
///
/// `Debug` is implemented by hand so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(rename = "USER")]
    pub username: String,
    #[serde(rename = "TOKEN")]
    pub token: String,
}

impl Authentication {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ── Client → server ───────────────────────────────────────────────────────────

/// A message originating from the lighthouse client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMessage {
    /// Unique per connection for as long as the request is outstanding.
    pub request_id: i64,
    pub verb: Verb,
    /// Path segments, e.g. `["user", "alice", "model"]`.
    pub path: Vec<String>,
    pub meta: BTreeMap<String, String>,
    pub authentication: Authentication,
    pub payload: Payload,
}

impl ClientMessage {
    /// Creates a request with empty `meta`.
    pub fn new(
        request_id: i64,
        verb: impl Into<Verb>,
        path: Vec<String>,
        authentication: Authentication,
        payload: Payload,
    ) -> Self {
        Self {
            request_id,
            verb: verb.into(),
            path,
            meta: BTreeMap::new(),
            authentication,
            payload,
        }
    }
}

// ── Server → client ───────────────────────────────────────────────────────────

/// An error response from the server: any status code other than 200.
#[derive(Debug, Clone, Error, PartialEq, Eq, Hash)]
#[error("server error {code}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct ServerError {
    pub code: i64,
    pub message: Option<String>,
}

/// A message originating from the lighthouse server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerMessage {
    /// HTTP-like status code, 200 on success.
    pub code: i64,
    /// Echo of the request this responds to (or the STREAM request id for pushes).
    pub request_id: i64,
    pub warnings: Option<Vec<String>>,
    pub response: Option<String>,
    pub payload: Payload,
}

impl ServerMessage {
    /// A `200` response with an empty payload.
    pub fn ok(request_id: i64) -> Self {
        Self::with_code(CODE_OK, request_id)
    }

    /// A response with the given code and nothing else.
    pub fn with_code(code: i64, request_id: i64) -> Self {
        Self {
            code,
            request_id,
            warnings: None,
            response: None,
            payload: Payload::Empty,
        }
    }

    /// Builder-style setter for the payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Builder-style setter for the response message.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Checks this response and returns only if successful.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] carrying the code and the optional response
    /// message when `code != 200`.
    pub fn check(&self) -> Result<(), ServerError> {
        if self.is_ok() {
            return Ok(());
        }
        Err(ServerError {
            code: self.code,
            message: self.response.clone(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_passes_on_200() {
        assert_eq!(ServerMessage::ok(3).check(), Ok(()));
    }

    #[test]
    fn test_check_reports_code_and_message() {
        // Arrange
        let msg = ServerMessage::with_code(CODE_BAD_REQUEST, 5).with_response("Bad Request");

        // Act
        let err = msg.check().unwrap_err();

        // Assert
        assert_eq!(err.code, 400);
        assert_eq!(err.message.as_deref(), Some("Bad Request"));
        assert_eq!(err.to_string(), "server error 400: Bad Request");
    }

    #[test]
    fn test_server_error_display_without_message() {
        let err = ServerError {
            code: 404,
            message: None,
        };
        assert_eq!(err.to_string(), "server error 404");
    }

    #[test]
    fn test_verb_well_known_and_custom() {
        assert!(Verb::new("PUT").is_well_known());
        assert!(Verb::from(Verb::STREAM).is_stream());
        assert!(!Verb::new("FOO").is_well_known());
        assert_eq!(Verb::new("FOO"), "FOO");
    }

    #[test]
    fn test_authentication_debug_redacts_token() {
        let auth = Authentication::new("alice", "s3cret");
        let debug = format!("{auth:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"), "token must not be printed");
    }

    #[test]
    fn test_authentication_json_uses_wire_keys() {
        let auth = Authentication::new("alice", "t");
        let json = serde_json::to_string(&auth).unwrap();
        assert_eq!(json, r#"{"USER":"alice","TOKEN":"t"}"#);
    }
}
