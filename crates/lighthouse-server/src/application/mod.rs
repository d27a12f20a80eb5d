//! Application layer for lighthouse-server.
//!
//! Owns every live session and routes decoded requests and broadcast frames
//! between them.  Sockets stay in the infrastructure layer; connections are
//! represented here only by an id and an outbound channel.

pub mod registry;

pub use registry::{ConnectionRegistry, RegistryError};
