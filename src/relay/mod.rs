//! Relay module
//!
//! - `RelayListener`: TCP accept loop, one upstream dial per client
//! - `RelayConnection`: bidirectional copy with half-close propagation
//!
//! Bytes are copied verbatim; nothing is inspected or framed.

pub mod connection;
pub mod listener;

pub use connection::{pump, relay, RelayConnection, RelayStats};
pub use listener::RelayListener;
