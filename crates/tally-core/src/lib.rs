//! tally core: metric taxonomy, payload shapes, and the shared error surface.
//!
//! This crate defines the closed set of metric kinds producers may submit and
//! the error types shared by the exporter. It intentionally carries no runtime
//! or transport dependencies so producers can depend on it without pulling in
//! the HTTP stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod duration;
pub mod error;
pub mod kind;
pub mod payload;

pub use error::{ErrorClass, Result, TallyError};
pub use kind::MetricKind;
pub use payload::MetricPayload;
