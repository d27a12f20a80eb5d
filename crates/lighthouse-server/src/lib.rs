//! lighthouse-server library crate.
//!
//! A reference Lighthouse peer for local development and end-to-end tests.
//! It speaks the same MessagePack-over-WebSocket protocol as the public
//! server but keeps everything in memory: one display per connection, no
//! persistence, no authentication checks.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Lighthouse client (MessagePack over WebSocket)
//!         ↕
//! [lighthouse-server]
//!   ├── domain/           ClientSession state machine, ServerConfig
//!   ├── application/      ConnectionRegistry: routing and fan-out
//!   └── infrastructure/
//!         └── ws_server/  WebSocket accept loop (tokio-tungstenite)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `lighthouse-core`; it talks to
//!   connections only through channels.
//! - `infrastructure` owns the sockets and the tasks.

/// Domain layer: session state and configuration.
pub mod domain;

/// Application layer: the connection registry.
pub mod application;

/// Infrastructure layer: the WebSocket server.
pub mod infrastructure;

pub use application::registry::ConnectionRegistry;
pub use domain::config::ServerConfig;
pub use domain::session::{ClientSession, SessionPolicy};
pub use infrastructure::ws_server::LighthouseServer;
