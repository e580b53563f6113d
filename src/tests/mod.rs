//! Test module for the proxy.
//!
//! - Integration tests (RPC proxying, relay streams, listener lifecycle, monitor)
