//! # Xenstore Telemetry
//!
//! Structured logging and Prometheus metrics for the domain layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xs_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `XS_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `XS_SERVICE_NAME` | `xenstored` | Service name attached to logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, DOMAINS_INTRODUCED, DOMAINS_RELEASED,
    RING_CORRUPTIONS, SWEEP_PASSES, WRL_DEBITS, WRL_THROTTLED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register all metrics.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;
    tracing::info!(service = %config.service_name, "Telemetry initialized");
    Ok(TelemetryGuard { _metrics: metrics })
}

/// Keeps telemetry active for the lifetime of the process.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

