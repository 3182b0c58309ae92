//! Prometheus metrics for stream ingestion.
//!
//! All metrics follow the naming convention: `oc_stream_<metric>_<unit>`
//!
//! Every metric is labelled by `channel`; drops are additionally labelled by
//! the rejection `reason`.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Raw frames received while a channel was open
    pub static ref STREAM_MESSAGES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("oc_stream_messages_received_total", "Frames received per channel"),
        &["channel"]
    ).expect("metric creation failed");

    /// Frames dropped before dispatch
    pub static ref STREAM_MESSAGES_DROPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("oc_stream_messages_dropped_total", "Frames dropped by validation"),
        &["channel", "reason"]
    ).expect("metric creation failed");

    /// Sequence gaps detected
    pub static ref STREAM_GAPS_DETECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("oc_stream_gaps_detected_total", "Sequence discontinuities per channel"),
        &["channel"]
    ).expect("metric creation failed");

    /// Sequence numbers skipped over by forward gaps
    pub static ref STREAM_MISSED_SEQUENCES: IntCounterVec = IntCounterVec::new(
        Opts::new("oc_stream_missed_sequences_total", "Sequence numbers never received"),
        &["channel"]
    ).expect("metric creation failed");

    /// Envelopes handed to subscribers
    pub static ref STREAM_DISPATCHES: IntCounterVec = IntCounterVec::new(
        Opts::new("oc_stream_dispatches_total", "Validated envelopes dispatched"),
        &["channel"]
    ).expect("metric creation failed");

    /// Connection state: 0 idle, 1 connecting, 2 open, 3 closed
    pub static ref STREAM_CHANNEL_STATE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("oc_stream_channel_state", "Current connection state per channel"),
        &["channel"]
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Registering twice fails with `MetricsInit`.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(STREAM_MESSAGES_RECEIVED.clone()),
        Box::new(STREAM_MESSAGES_DROPPED.clone()),
        Box::new(STREAM_GAPS_DETECTED.clone()),
        Box::new(STREAM_MISSED_SEQUENCES.clone()),
        Box::new(STREAM_DISPATCHES.clone()),
        Box::new(STREAM_CHANNEL_STATE.clone()),
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
