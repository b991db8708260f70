//! Integration tests for the chainlake serving tier.
//!
//! This crate contains the cross-component test modules:
//!
//! - `handler_tests`: unary handler behavior end to end against the
//!   in-memory backends (range reads, watermark rejection, feature gates,
//!   transaction resolution, presigned files, chain metadata)
//! - `streaming_tests`: event-stream delivery, cursor positions, idle
//!   timeout and graceful-shutdown behavior
//! - `fixtures`: reusable fixtures (seeded lake, counting object store,
//!   deterministic parser)
//!
//! Component-level tests live next to their modules in `chainlake-core`;
//! everything here drives the public service surface.
//!
//! ## Running
//!
//! ```bash
//! cargo test --package tests
//! ```

pub mod fixtures;

#[cfg(test)]
mod handler_tests;

#[cfg(test)]
mod streaming_tests;
