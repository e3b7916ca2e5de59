//! # Metrics Seam
//!
//! Metrics emission is an external collaborator consumed through a narrow
//! interface: counters, duration histograms and gauges by name. The engines
//! derive every value from the pass just computed; nothing here is separately
//! tracked state. Metric names live in [`crate::constants::metrics`].

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Narrow metrics client the engines emit through.
pub trait MetricsClient: Send + Sync {
    fn increment_counter(&self, name: &str, value: u64);
    fn record_duration_millis(&self, name: &str, millis: u64);
    fn set_gauge(&self, name: &str, value: i64);
}

/// Discards everything. Default for deployments without a metrics backend.
pub struct NoopMetrics;

impl MetricsClient for NoopMetrics {
    fn increment_counter(&self, _name: &str, _value: u64) {}
    fn record_duration_millis(&self, _name: &str, _millis: u64) {}
    fn set_gauge(&self, _name: &str, _value: i64) {}
}

/// Accumulating client for tests and local inspection.
#[derive(Default)]
pub struct InMemoryMetrics {
    counters: Mutex<HashMap<String, u64>>,
    durations: Mutex<HashMap<String, Vec<u64>>>,
    gauges: Mutex<HashMap<String, i64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn durations(&self, name: &str) -> Vec<u64> {
        self.durations.lock().get(name).cloned().unwrap_or_default()
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.lock().get(name).copied()
    }
}

impl MetricsClient for InMemoryMetrics {
    fn increment_counter(&self, name: &str, value: u64) {
        *self.counters.lock().entry(name.to_string()).or_insert(0) += value;
    }

    fn record_duration_millis(&self, name: &str, millis: u64) {
        self.durations
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(millis);
    }

    fn set_gauge(&self, name: &str, value: i64) {
        self.gauges.lock().insert(name.to_string(), value);
    }
}
