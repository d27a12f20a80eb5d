//! Domain layer for lighthouse-server.
//!
//! Pure types with no networking: the per-connection [`ClientSession`] state
//! machine and the [`ServerConfig`] it is configured by.

pub mod config;
pub mod session;

pub use config::ServerConfig;
pub use session::{ClientSession, SessionOutcome, SessionPolicy};
