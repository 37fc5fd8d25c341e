//! logcount core: message model, line-protocol rendering, and the shared error surface.
//!
//! This crate holds everything a filter needs to describe what it emits
//! without knowing how the host pipeline moves messages around. It carries
//! no runtime dependencies so plugins and the host can share it freely.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here; every fallible
//! path surfaces as `LogCountError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod line;
pub mod message;

/// Shared result type.
pub use error::{LogCountError, Result};
