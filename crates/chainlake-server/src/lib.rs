//! gRPC serving tier for the chainlake data lake.
//!
//! The binary in `main.rs` wires the [`handler::Server`] behind the
//! [`middleware::AdmissionLayer`] on a tonic transport with keepalive and
//! graceful shutdown. The handler and middleware are exported for the
//! integration test crate.

pub mod handler;
pub mod middleware;
mod rpc;

pub use handler::Server;
