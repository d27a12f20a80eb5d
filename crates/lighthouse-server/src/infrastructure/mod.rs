//! Infrastructure layer for lighthouse-server.
//!
//! Handles all I/O: binding the listener, the WebSocket handshake, and the
//! reader/writer tasks of each connection.  Request semantics live in the
//! domain and application layers.

pub mod ws_server;

pub use ws_server::LighthouseServer;
