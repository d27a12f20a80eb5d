//! lighthouse-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the demo binary in `main.rs` share the same module tree.
//!
//! # What does lighthouse-client do? (for beginners)
//!
//! A Lighthouse client keeps **one** WebSocket open to the server and sends
//! many requests over it, often concurrently: a `PUT` of the next frame may
//! be in flight while a `STREAM` of keyboard events is delivering pushes and
//! a `LIST` is waiting for its answer.  Responses arrive in whatever order the
//! server produces them, so each request carries a numeric id and every
//! response echoes it.
//!
//! The client crate is organised in three layers:
//!
//! 1. **`domain`** – Plain configuration ([`ClientConfig`]).
//! 2. **`application`** – The request multiplexer, which pairs responses to
//!    outstanding requests by id, and the typed verb API ([`Lighthouse`])
//!    built on top of it.
//! 3. **`infrastructure`** – The byte transports: a tokio-tungstenite
//!    WebSocket for production and an in-memory mock for tests.
//!
//! # Quick start
//!
//! ```no_run
//! use lighthouse_client::{connect_websocket, ClientConfig};
//! use lighthouse_core::{Authentication, Color, Frame};
//!
//! # async fn run() -> Result<(), lighthouse_client::LighthouseError> {
//! let config = ClientConfig::new(Authentication::new("alice", "API-TOK_..."));
//! let lh = connect_websocket(config).await?;
//! lh.put_model(Frame::fill(Color::RED)).await?;
//! # Ok(())
//! # }
//! ```

/// Domain layer: client configuration.
pub mod domain;

/// Application layer: request multiplexing and the verb API.
pub mod application;

/// Infrastructure layer: WebSocket and in-memory transports.
pub mod infrastructure;

use std::sync::Arc;

pub use application::lighthouse::Lighthouse;
pub use application::multiplexer::{ConnectionState, LighthouseError, Multiplexer, ResponseStream};
pub use application::transport::{BinaryHandler, Transport, TransportError};
pub use domain::config::ClientConfig;
pub use infrastructure::transport::{MockTransport, WebSocketTransport};

/// Opens a WebSocket to `config.url` and returns a connected [`Lighthouse`].
///
/// # Errors
///
/// Returns [`LighthouseError::Transport`] if the WebSocket handshake fails.
pub async fn connect_websocket(config: ClientConfig) -> Result<Lighthouse, LighthouseError> {
    let transport = Arc::new(WebSocketTransport::new(config.url.clone()));
    let lighthouse = Lighthouse::new(transport, config.authentication);
    lighthouse.connect().await?;
    Ok(lighthouse)
}
