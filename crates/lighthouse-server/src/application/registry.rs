//! The set of live connections and the routing between them.
//!
//! # How a frame travels (for beginners)
//!
//! ```text
//! reader task ──handle_frame(id, bytes)──► decode ──► ClientSession::handle
//!                                                          │
//!                 ┌────────────── response ────────────────┤
//!                 ▼                                        ▼ broadcast frame
//!        outbound[id] (mpsc)             outbound[peer] for every other
//!                 │                      streaming session, tagged with
//!                 ▼                      that session's STREAM request id
//!           writer task
//! ```
//!
//! Each connection is known here only by its [`Uuid`] and the sending half of
//! an unbounded channel; the writer task on the other end owns the socket.
//! Sending into the channel never blocks, so the registry lock is only held
//! for short, non-async sections.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lighthouse_core::{
    decode_client_message, encode_server_message, Payload, ProtocolError, ServerMessage, Verb,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::session::{ClientSession, SessionPolicy};

/// Errors from routing one inbound frame.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The frame came from a connection that is not (or no longer) registered.
    #[error("unknown connection {0}")]
    UnknownConnection(Uuid),

    /// The frame was not a valid request, or the response could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

struct Connection {
    session: ClientSession,
    outbound: UnboundedSender<Vec<u8>>,
}

impl Connection {
    /// Queues `msg` for this connection's writer.  A closed channel means the
    /// connection is being torn down, so the message is dropped.
    fn send(&self, msg: &ServerMessage) -> Result<(), ProtocolError> {
        let bytes = encode_server_message(msg)?;
        if self.outbound.send(bytes).is_err() {
            debug!("outbound channel closed; dropping response {}", msg.request_id);
        }
        Ok(())
    }
}

/// All live sessions, keyed by connection id.
pub struct ConnectionRegistry {
    policy: SessionPolicy,
    connections: Mutex<HashMap<Uuid, Connection>>,
}

impl ConnectionRegistry {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a connection with a fresh session and returns its id.
    pub fn register(&self, outbound: UnboundedSender<Vec<u8>>) -> Uuid {
        let id = Uuid::new_v4();
        let connection = Connection {
            session: ClientSession::new(self.policy),
            outbound,
        };
        lock(&self.connections).insert(id, connection);
        info!("opened connection {id}");
        id
    }

    /// Removes a connection and all of its session state.
    ///
    /// Returns `false` if the id was not registered.
    pub fn unregister(&self, id: Uuid) -> bool {
        let removed = lock(&self.connections).remove(&id).is_some();
        if removed {
            info!("closed connection {id}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        lock(&self.connections).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the session behind `id`.
    pub fn session(&self, id: Uuid) -> Option<ClientSession> {
        lock(&self.connections)
            .get(&id)
            .map(|connection| connection.session.clone())
    }

    /// Handles one inbound binary frame from connection `id`.
    ///
    /// Decodes the request, runs it through the connection's session, queues
    /// the response, and pushes a broadcast frame (if any) to every *other*
    /// session with streaming enabled.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Protocol`] if `bytes` is not a valid request; no
    ///   response is sent.
    /// - [`RegistryError::UnknownConnection`] if `id` is not registered.
    pub fn handle_frame(&self, id: Uuid, bytes: &[u8]) -> Result<(), RegistryError> {
        let msg = decode_client_message(bytes)?;
        debug!("connection {id}: {} {:?}", msg.verb, msg.path);

        let mut connections = lock(&self.connections);

        let peers: Vec<String> = if msg.verb == Verb::LIST {
            connections
                .iter()
                .filter(|(other, _)| **other != id)
                .filter_map(|(_, c)| c.session.name().map(str::to_owned))
                .collect()
        } else {
            Vec::new()
        };
        let peers: Vec<&str> = peers.iter().map(String::as_str).collect();

        let connection = connections
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        let outcome = connection.session.handle(&msg, &peers);
        connection.send(&outcome.response)?;

        if let Some(frame) = outcome.broadcast {
            let payload = Payload::Frame(frame);
            for (peer_id, peer) in connections.iter().filter(|(other, _)| **other != id) {
                let Some(stream_id) = peer.session.stream_request_id() else {
                    continue;
                };
                let push = ServerMessage::ok(stream_id).with_payload(payload.clone());
                if let Err(e) = peer.send(&push) {
                    warn!("could not push frame to {peer_id}: {e}");
                }
            }
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
