//! # Console Telemetry
//!
//! Logging and metrics for the operator console.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, pretty console
//!   output for development and JSON lines for log shippers.
//! - **Metrics**: Prometheus counters and gauges for stream ingestion.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use console_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `operator-console` | Service name in log records |
//! | `OC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `OC_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |
//! | `OC_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, STREAM_CHANNEL_STATE, STREAM_DISPATCHES,
    STREAM_GAPS_DETECTED, STREAM_MESSAGES_DROPPED, STREAM_MESSAGES_RECEIVED, STREAM_MISSED_SEQUENCES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Log a channel-scoped event with the standard `channel` field.
///
/// ```rust,ignore
/// log_channel_event!(warn, Channel::Market, "Sequence gap", expected = 2, actual = 3);
/// ```
#[macro_export]
macro_rules! log_channel_event {
    ($level:ident, $channel:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            channel = %$channel,
            $($($field)*,)?
            $msg
        )
    };
}
