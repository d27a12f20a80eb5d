//! Transport implementations.
//!
//! The trait itself lives at the application seam and is re-exported here so
//! callers can import the trait and its implementations from one place.

pub mod mock;
pub mod websocket;

pub use crate::application::transport::{BinaryHandler, Transport, TransportError};
pub use mock::MockTransport;
pub use websocket::WebSocketTransport;
