//! The byte-transport seam used by the multiplexer.
//!
//! A transport is a connected duplex pipe of **binary frames**: one
//! MessagePack-encoded envelope per frame.  It knows nothing about request
//! ids or payloads.
//!
//! Infrastructure implementations use a WebSocket; tests use
//! [`MockTransport`](crate::infrastructure::transport::MockTransport) or a
//! mockall double.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// `send` was called before a successful `connect`, or after the
    /// connection was lost.
    #[error("transport is not connected")]
    NotConnected,
}

/// Callback invoked with every inbound binary frame.
///
/// May be called from any task and concurrently with itself.
pub type BinaryHandler = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// A connected duplex transport of binary frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Writes one binary frame.
    ///
    /// Callers must not invoke this concurrently; the multiplexer holds a
    /// write lock around every call.
    async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Registers a callback for inbound binary frames.
    ///
    /// Register before [`connect`](Self::connect) so no frame is missed.
    fn on_binary(&self, handler: BinaryHandler);
}
