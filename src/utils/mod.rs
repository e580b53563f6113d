//! Utility module: errors, logging, metrics, serde and redaction helpers, listener lifecycle.

pub mod errors;
pub mod lifecycle;
pub mod metrics;
pub mod logging;
pub mod serde_helpers;

pub use errors::{ConfigError, MonitorError, ProxyError, Result, AUTH_CHALLENGE, AUTH_REALM};
pub use lifecycle::{shutdown_requested, ConnectionSlots};
pub use metrics::{MetricsRegistry, METRICS};
pub use logging::init_logging;
