//! Request multiplexer: many concurrent requests over one connection.
//!
//! # How responses find their way back (for beginners)
//!
//! Every request gets a fresh numeric id.  Before the request is written to
//! the socket, the multiplexer records *who is waiting* for that id in the
//! pending table:
//!
//! ```text
//! request id ──► OneShot(oneshot::Sender)        one response, then removed
//!            └─► Streaming(mpsc::UnboundedSender) every response, until cancelled
//! ```
//!
//! When a frame arrives, the inbound handler decodes it, looks its `REID` up
//! in the table and forwards the message.  Responses for ids that are not in
//! the table (late pushes for a cancelled stream, for example) are logged and
//! dropped.
//!
//! # Locks
//!
//! - The pending table sits behind a `std::sync::Mutex`.  It is held only for
//!   short, non-async sections: allocate + register, dispatch, deregister.
//!   Dispatch delivers *while holding it*, so once a stream has deregistered
//!   nothing can be pushed into its channel.
//! - Writes go through a `tokio::sync::Mutex<()>` held across the
//!   `Transport::send` await, so frames from concurrent callers never
//!   interleave on the wire.
//!
//! There are no timeouts: a one-shot request whose response never arrives
//! waits forever.  Wrap the call in `tokio::time::timeout` if that matters.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_util::Stream;
use lighthouse_core::{
    decode_server_message, encode_client_message, Authentication, ClientMessage, Payload,
    ProtocolError, ServerError, ServerMessage, Verb,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use crate::application::transport::{Transport, TransportError};

/// Errors surfaced to callers of the multiplexer and the verb API.
#[derive(Debug, Error)]
pub enum LighthouseError {
    /// Connecting or writing at the socket layer failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An outbound envelope could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server answered with a status code other than 200.
    #[error("server error {code}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server { code: i64, message: Option<String> },

    /// The caller misused the API, e.g. sent `STREAM` through the one-shot path.
    #[error("protocol misuse: {0}")]
    ProtocolUsage(String),

    /// The operation is not valid in the current connection state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl From<ServerError> for LighthouseError {
    fn from(err: ServerError) -> Self {
        LighthouseError::Server {
            code: err.code,
            message: err.message,
        }
    }
}

/// Lifecycle of a multiplexer's single connection.
///
/// There is no reconnect: a failed instance stays failed, and callers who want
/// to retry create a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Failed,
}

// ── Pending table ─────────────────────────────────────────────────────────────

enum PendingEntry {
    OneShot(oneshot::Sender<ServerMessage>),
    Streaming(mpsc::UnboundedSender<ServerMessage>),
}

#[derive(Default)]
struct PendingTable {
    next_request_id: i64,
    entries: HashMap<i64, PendingEntry>,
}

/// State shared between callers and the inbound handler.
#[derive(Default)]
struct Shared {
    pending: Mutex<PendingTable>,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates the next id and registers `entry` under it in one critical
    /// section.
    fn register(self: &Arc<Self>, entry: PendingEntry) -> Registration {
        let mut table = self.table();
        let id = table.next_request_id;
        table.next_request_id += 1;
        table.entries.insert(id, entry);
        trace!(request_id = id, pending = table.entries.len(), "registered pending request");
        Registration {
            shared: Arc::clone(self),
            id,
            released: false,
        }
    }

    fn deregister(&self, id: i64) {
        if self.table().entries.remove(&id).is_some() {
            trace!(request_id = id, "deregistered pending request");
        }
    }

    /// Routes one inbound frame to whoever is waiting for it.
    fn dispatch(&self, bytes: &[u8]) {
        let msg = match decode_server_message(bytes) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("dropping undecodable frame ({} bytes): {e}", bytes.len());
                return;
            }
        };
        let id = msg.request_id;

        let mut table = self.table();
        match table.entries.remove(&id) {
            None => {
                debug!(request_id = id, code = msg.code, "dropping response with no pending request");
            }
            Some(PendingEntry::OneShot(tx)) => {
                if tx.send(msg).is_err() {
                    debug!(request_id = id, "one-shot caller went away before its response");
                }
            }
            Some(PendingEntry::Streaming(tx)) => match tx.send(msg) {
                Ok(()) => {
                    table.entries.insert(id, PendingEntry::Streaming(tx));
                }
                Err(_) => {
                    debug!(request_id = id, "stream consumer went away; deregistered");
                }
            },
        }
    }
}

/// Removes its pending entry when dropped.
///
/// Ties the lifetime of a table entry to the caller: a one-shot future that is
/// dropped, a failed send, or a dropped [`ResponseStream`] all clean up.
struct Registration {
    shared: Arc<Shared>,
    id: i64,
    released: bool,
}

impl Registration {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.deregister(self.id);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}

// ── ResponseStream ────────────────────────────────────────────────────────────

/// The open-ended sequence of responses to a streaming request.
///
/// Yields every response the server sends for the request id, in arrival
/// order, including non-200 ones.  It never ends on its own; call
/// [`cancel`](Self::cancel) (or drop it) to deregister.  After cancelling,
/// `poll_next` returns `None` and later responses for the id are dropped by
/// the dispatcher.
pub struct ResponseStream {
    registration: Registration,
    receiver: mpsc::UnboundedReceiver<ServerMessage>,
}

impl ResponseStream {
    /// The request id the server echoes on every element.
    pub fn request_id(&self) -> i64 {
        self.registration.id
    }

    /// Deregisters the stream.  Returns once the entry is gone, so no
    /// response processed afterwards can reach this stream.
    pub fn cancel(&mut self) {
        self.registration.release();
        self.receiver.close();
        debug!(request_id = self.registration.id, "stream cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.registration.released
    }
}

impl Stream for ResponseStream {
    type Item = ServerMessage;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ServerMessage>> {
        let this = self.get_mut();
        if this.registration.released {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}

impl std::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("request_id", &self.registration.id)
            .field("cancelled", &self.registration.released)
            .finish()
    }
}

// ── Multiplexer ───────────────────────────────────────────────────────────────

/// Owns one transport connection and the table of outstanding requests.
pub struct Multiplexer {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    write_lock: tokio::sync::Mutex<()>,
    state: Mutex<ConnectionState>,
}

impl Multiplexer {
    /// Creates an unconnected multiplexer over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            shared: Arc::new(Shared::default()),
            write_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(ConnectionState::Idle),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.lock_state()
    }

    /// Number of requests currently waiting for a response (streams included).
    pub fn pending_requests(&self) -> usize {
        self.shared.table().entries.len()
    }

    /// Registers the inbound handler and connects the transport.
    ///
    /// # Errors
    ///
    /// - [`LighthouseError::InvalidState`] if called more than once.
    /// - [`LighthouseError::Transport`] if the transport fails to connect; the
    ///   instance is then permanently [`ConnectionState::Failed`].
    pub async fn connect(&self) -> Result<(), LighthouseError> {
        {
            let mut state = self.lock_state();
            if *state != ConnectionState::Idle {
                return Err(LighthouseError::InvalidState("connect may only be called once"));
            }
            *state = ConnectionState::Connecting;
        }

        let shared = Arc::clone(&self.shared);
        self.transport
            .on_binary(Arc::new(move |bytes: Vec<u8>| shared.dispatch(&bytes)));

        match self.transport.connect().await {
            Ok(()) => {
                *self.lock_state() = ConnectionState::Connected;
                info!("connected");
                Ok(())
            }
            Err(e) => {
                *self.lock_state() = ConnectionState::Failed;
                error!("connect failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Sends a request and waits for its single response.
    ///
    /// The response is returned as-is; checking the status code is the
    /// caller's job (the verb API does it).
    ///
    /// # Errors
    ///
    /// - [`LighthouseError::ProtocolUsage`] for `STREAM`, before any I/O.
    /// - [`LighthouseError::InvalidState`] if not connected.
    /// - [`LighthouseError::Transport`] if the write fails; the pending entry
    ///   is removed and other requests are unaffected.
    pub async fn send_one_shot(
        &self,
        verb: impl Into<Verb>,
        path: Vec<String>,
        payload: Payload,
        authentication: &Authentication,
    ) -> Result<ServerMessage, LighthouseError> {
        let verb = verb.into();
        if verb.is_stream() {
            return Err(LighthouseError::ProtocolUsage(
                "STREAM has an open-ended response; use send_streaming".to_string(),
            ));
        }
        self.ensure_connected()?;

        let (tx, rx) = oneshot::channel();
        let registration = self.shared.register(PendingEntry::OneShot(tx));
        let msg = ClientMessage::new(registration.id, verb, path, authentication.clone(), payload);
        self.transmit(&msg).await?;

        // Only dispatch drops the sender, and only after sending on it.
        let response = rx
            .await
            .map_err(|_| LighthouseError::InvalidState("pending request removed"))?;
        drop(registration);
        Ok(response)
    }

    /// Sends a request whose responses form an open-ended stream.
    ///
    /// # Errors
    ///
    /// - [`LighthouseError::InvalidState`] if not connected.
    /// - [`LighthouseError::Transport`] if the write fails.
    pub async fn send_streaming(
        &self,
        verb: impl Into<Verb>,
        path: Vec<String>,
        payload: Payload,
        authentication: &Authentication,
    ) -> Result<ResponseStream, LighthouseError> {
        self.ensure_connected()?;

        let (tx, receiver) = mpsc::unbounded_channel();
        let registration = self.shared.register(PendingEntry::Streaming(tx));
        let msg = ClientMessage::new(
            registration.id,
            verb,
            path,
            authentication.clone(),
            payload,
        );
        self.transmit(&msg).await?;

        Ok(ResponseStream {
            registration,
            receiver,
        })
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_connected(&self) -> Result<(), LighthouseError> {
        match self.state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Failed => Err(LighthouseError::InvalidState("connection failed")),
            ConnectionState::Idle | ConnectionState::Connecting => {
                Err(LighthouseError::InvalidState("not connected"))
            }
        }
    }

    /// Encodes `msg` and writes it while holding the write lock.
    async fn transmit(&self, msg: &ClientMessage) -> Result<(), LighthouseError> {
        let bytes = encode_client_message(msg)?;
        let _writer = self.write_lock.lock().await;
        debug!(request_id = msg.request_id, verb = %msg.verb, "sending request");
        self.transport.send(bytes).await.map_err(|e| {
            warn!(request_id = msg.request_id, "send failed: {e}");
            LighthouseError::from(e)
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
