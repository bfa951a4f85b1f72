//! Prometheus metrics for the domain layer.
//!
//! All metrics follow the naming convention: `xs_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DOMAIN REGISTRY
    // =========================================================================

    /// Domains currently introduced
    pub static ref DOMAINS_INTRODUCED: Gauge = Gauge::new(
        "xs_domain_introduced",
        "Number of domains with a live connection"
    ).expect("metric creation failed");

    /// Domains torn down
    pub static ref DOMAINS_RELEASED: Counter = Counter::new(
        "xs_domain_released_total",
        "Total domain connections torn down"
    ).expect("metric creation failed");

    /// Cleanup passes completed
    pub static ref SWEEP_PASSES: Counter = Counter::new(
        "xs_domain_sweep_passes_total",
        "Total cleanup sweeps run"
    ).expect("metric creation failed");

    // =========================================================================
    // RING TRANSPORT
    // =========================================================================

    /// Rings found with out-of-range indexes
    pub static ref RING_CORRUPTIONS: Counter = Counter::new(
        "xs_ring_corruptions_total",
        "Total rings rejected for corrupted indexes"
    ).expect("metric creation failed");

    // =========================================================================
    // WRITE RATE LIMIT
    // =========================================================================

    /// Writes charged to a domain
    pub static ref WRL_DEBITS: Counter = Counter::new(
        "xs_wrl_debits_total",
        "Total writes charged against domain credit"
    ).expect("metric creation failed");

    /// Charges that left a domain throttled
    pub static ref WRL_THROTTLED: Counter = Counter::new(
        "xs_wrl_throttled_total",
        "Total charges that drove a domain's credit negative"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DOMAINS_INTRODUCED.clone()),
        Box::new(DOMAINS_RELEASED.clone()),
        Box::new(SWEEP_PASSES.clone()),
        Box::new(RING_CORRUPTIONS.clone()),
        Box::new(WRL_DEBITS.clone()),
        Box::new(WRL_THROTTLED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
