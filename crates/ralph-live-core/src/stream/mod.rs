//! Live log streaming.
//!
//! - **frame**: decoding of individual log frames (skip-and-continue)
//! - **connection**: `ConnectionManager`, the per-orchestrator stream owner

mod connection;
pub mod frame;

pub use connection::ConnectionManager;
