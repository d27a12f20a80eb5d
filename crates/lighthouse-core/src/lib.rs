//! # lighthouse-core
//!
//! Shared library for the Lighthouse client and the reference server containing
//! the display and input domain types, the payload codec, and the request and
//! response envelopes.
//!
//! This crate is used by both the client and the reference server.
//! It has zero dependencies on network sockets or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! The lighthouse is a remote display made of a fixed grid of RGB pixels.
//! Clients talk to it over a single WebSocket connection: they send requests
//! (`PUT` a frame, `STREAM` the input events of a model, `LIST` a directory,
//! and so on) and the server answers with responses that carry the same
//! request id.
//!
//! This crate (`lighthouse-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The values that travel inside messages: [`Frame`]s of
//!   [`Color`]s, [`InputEvent`]s from the web interface, and
//!   [`DirectoryTree`] listings.
//!
//! - **`protocol`** – How those values travel over the network.  Every message
//!   is a MessagePack map with short upper-case keys (`REID`, `VERB`, `PAYL`,
//!   ...).  The polymorphic payload carries no type tag, so decoding tries each
//!   known shape in a fixed priority order.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `lighthouse_core::Frame` instead of `lighthouse_core::domain::display::Frame`.
pub use domain::directory::{DirectoryTree, Entry};
pub use domain::display::{Color, Frame, LIGHTHOUSE_COLS, LIGHTHOUSE_ROWS, LIGHTHOUSE_SIZE};
pub use domain::input::InputEvent;
pub use protocol::codec::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    ProtocolError,
};
pub use protocol::messages::{Authentication, ClientMessage, ServerError, ServerMessage, Verb};
pub use protocol::payload::Payload;
