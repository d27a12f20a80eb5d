//! Domain values carried inside Lighthouse protocol messages.
//!
//! This module contains plain data types with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core data of the application.
//! - Has **no** imports from network libraries or async runtimes.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! The wire representation of these values lives in [`crate::protocol`]; the
//! domain types themselves know nothing about MessagePack.

/// Pixel colours and the fixed-size display frame.
pub mod display;

/// Recursive resource listings returned by `LIST`.
pub mod directory;

/// Key and controller events from the web interface.
pub mod input;
