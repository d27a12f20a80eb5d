//! Per-connection session state and request handling.
//!
//! # What is a session? (for beginners)
//!
//! Every WebSocket connection to the server gets one [`ClientSession`].  The
//! session remembers three things between requests:
//!
//! - **who** is connected (the username from the last request's `AUTH`),
//! - **whether** the client asked to stream, and with which request id,
//! - **what** the display currently shows.
//!
//! [`ClientSession::handle`] turns one request into a [`SessionOutcome`]: the
//! response to send back and, for a frame upload, the frame to push to every
//! other streaming client.  The session never touches a socket; the registry
//! does the sending.
//!
//! # Verb table
//!
//! ```text
//! STREAM                       200, enable pushes (remember the request id)
//! PUT / POST + Frame           200, update the display, broadcast the frame
//! PUT / POST model, no Frame   400 "Bad Request"
//! PUT / POST (other path)      200
//! GET                          200 + current display frame
//! LIST                         200 + { "user": { <name>: { "model": nil } } }
//! CREATE MKDIR DELETE
//! LINK UNLINK STOP             200
//! anything else                400 "Bad Request"
//! ```

use lighthouse_core::protocol::CODE_BAD_REQUEST;
use lighthouse_core::{ClientMessage, DirectoryTree, Entry, Frame, Payload, ServerMessage, Verb};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Response text for unknown verbs and frameless model uploads.
pub const BAD_REQUEST: &str = "Bad Request";

/// Tunable session behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    /// Take the session name from every request's `AUTH`, not only the first.
    pub rename_on_every_request: bool,

    /// Let `STOP` switch streaming back off.
    pub stop_disables_streaming: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            rename_on_every_request: true,
            stop_disables_streaming: false,
        }
    }
}

/// The result of handling one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// Sent back to the requesting client.
    pub response: ServerMessage,

    /// A frame to push to every other streaming client.
    pub broadcast: Option<Frame>,
}

impl SessionOutcome {
    fn reply(response: ServerMessage) -> Self {
        Self {
            response,
            broadcast: None,
        }
    }
}

/// State kept for one connected client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSession {
    policy: SessionPolicy,
    name: Option<String>,
    streaming_enabled: bool,
    stream_request_id: Option<i64>,
    display: Frame,
}

impl ClientSession {
    /// A fresh session: unnamed, not streaming, black display.
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            name: None,
            streaming_enabled: false,
            stream_request_id: None,
            display: Frame::default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming_enabled
    }

    /// The request id pushes are tagged with, if streaming.
    pub fn stream_request_id(&self) -> Option<i64> {
        self.stream_request_id.filter(|_| self.streaming_enabled)
    }

    pub fn display(&self) -> &Frame {
        &self.display
    }

    /// Handles one request.
    ///
    /// `peers` are the names of the *other* sessions; only `LIST` reads them.
    pub fn handle(&mut self, msg: &ClientMessage, peers: &[&str]) -> SessionOutcome {
        self.identify(&msg.authentication.username);

        let id = msg.request_id;
        match msg.verb.as_str() {
            Verb::STREAM => {
                self.streaming_enabled = true;
                self.stream_request_id = Some(id);
                debug!("session {:?} streaming as request {id}", self.name);
                SessionOutcome::reply(ServerMessage::ok(id))
            }
            Verb::PUT | Verb::POST => match &msg.payload {
                Payload::Frame(frame) => {
                    self.display = frame.clone();
                    SessionOutcome {
                        response: ServerMessage::ok(id),
                        broadcast: Some(frame.clone()),
                    }
                }
                _ if is_model_path(&msg.path) => {
                    debug!("rejecting {} to {:?} without a frame", msg.verb, msg.path);
                    SessionOutcome::reply(bad_request(id))
                }
                _ => SessionOutcome::reply(ServerMessage::ok(id)),
            },
            Verb::GET => SessionOutcome::reply(
                ServerMessage::ok(id).with_payload(Payload::Frame(self.display.clone())),
            ),
            Verb::LIST => {
                let names = self.name.as_deref().into_iter().chain(peers.iter().copied());
                SessionOutcome::reply(
                    ServerMessage::ok(id).with_payload(Payload::DirectoryTree(user_directory(names))),
                )
            }
            Verb::STOP => {
                if self.policy.stop_disables_streaming {
                    self.streaming_enabled = false;
                    self.stream_request_id = None;
                }
                SessionOutcome::reply(ServerMessage::ok(id))
            }
            Verb::CREATE | Verb::MKDIR | Verb::DELETE | Verb::LINK | Verb::UNLINK => {
                SessionOutcome::reply(ServerMessage::ok(id))
            }
            other => {
                debug!("rejecting unknown verb {other:?}");
                SessionOutcome::reply(bad_request(id))
            }
        }
    }

    fn identify(&mut self, username: &str) {
        if self.name.is_none() || self.policy.rename_on_every_request {
            self.name = Some(username.to_owned());
        }
    }
}

fn bad_request(request_id: i64) -> ServerMessage {
    ServerMessage::with_code(CODE_BAD_REQUEST, request_id).with_response(BAD_REQUEST)
}

/// A display model lives at a path ending in `model`.
fn is_model_path(path: &[String]) -> bool {
    path.last().is_some_and(|segment| segment == "model")
}

/// Builds `{ "user": { <name>: { "model": nil } } }` for the given names.
pub fn user_directory<'a>(names: impl IntoIterator<Item = &'a str>) -> DirectoryTree {
    let users = names
        .into_iter()
        .map(|name| {
            (
                name.to_owned(),
                Entry::Directory(DirectoryTree::new().with("model", Entry::Resource)),
            )
        })
        .collect::<DirectoryTree>();
    DirectoryTree::new().with("user", users)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
