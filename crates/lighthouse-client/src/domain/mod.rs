//! Domain layer for lighthouse-client.
//!
//! Pure data with no I/O: the settings a client needs before it can open a
//! connection.  The demo binary fills these in from CLI arguments and
//! environment variables; tests build them directly.

pub mod config;

pub use config::ClientConfig;
