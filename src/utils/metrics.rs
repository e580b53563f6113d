use std::collections::HashMap;
use std::sync::Arc;
use lazy_static::lazy_static;
use parking_lot::Mutex;

pub const RPC_REQUESTS: &str = "rpc_requests_total";
pub const RPC_AUTH_FAILURES: &str = "rpc_auth_failures_total";
pub const RPC_UPSTREAM_ERRORS: &str = "rpc_upstream_errors_total";
pub const RELAY_CONNECTIONS: &str = "relay_connections_total";
pub const RELAY_DIAL_FAILURES: &str = "relay_dial_failures_total";
pub const RELAY_BYTES_TO_UPSTREAM: &str = "relay_bytes_to_upstream_total";
pub const RELAY_BYTES_TO_CLIENT: &str = "relay_bytes_to_client_total";
pub const RELAY_ACTIVE: &str = "relay_active_connections";

/// Metrics registry (simple, Prometheus-style)
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    gauges: Arc<Mutex<HashMap<String, f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        self.add_counter(name, 1);
    }

    pub fn add_counter(&self, name: &str, delta: u64) {
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += delta;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn add_gauge(&self, name: &str, delta: f64) {
        let mut gauges = self.gauges.lock();
        *gauges.entry(name.to_string()).or_insert(0.0) += delta;
    }

    pub fn snapshot(&self) -> (HashMap<String, u64>, HashMap<String, f64>) {
        (self.counters.lock().clone(), self.gauges.lock().clone())
    }
}

lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}
