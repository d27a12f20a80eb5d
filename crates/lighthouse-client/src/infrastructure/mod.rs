//! Infrastructure layer for lighthouse-client.
//!
//! Contains the concrete byte transports behind the
//! [`Transport`](crate::application::transport::Transport) seam.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lighthouse_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`transport::websocket`** – tokio-tungstenite client.  One reader task
//!   per connection hands every binary frame to the registered handlers.
//!
//! - **`transport::mock`** – In-memory transport that records outbound frames
//!   and lets tests inject inbound ones.

pub mod transport;
