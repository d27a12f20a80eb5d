//! Application layer for lighthouse-client.
//!
//! # What lives here?
//!
//! - **`transport`** – The [`Transport`](transport::Transport) trait: the
//!   seam between the multiplexer and whatever actually moves bytes.  The
//!   implementations live in the infrastructure layer.
//!
//! - **`multiplexer`** – Allocates request ids, keeps the table of
//!   outstanding requests, serialises writes, and routes each inbound frame to
//!   the caller (one-shot) or stream (streaming) waiting for it.
//!
//! - **`lighthouse`** – The typed verb API (`put`, `list`, `stream`, ...)
//!   that adds credentials and turns non-200 responses into errors.

pub mod lighthouse;
pub mod multiplexer;
pub mod transport;
