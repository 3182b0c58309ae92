//! Error types for the stream client.

use std::time::Duration;

use shared_types::Channel;
use thiserror::Error;

use crate::config::ConfigError;

/// Why an inbound frame was dropped before dispatch.
///
/// Rejections are never propagated to callers of the manager; they are
/// logged, counted and surfaced through `PipelineOutcome` for tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Malformed wire encoding: {0}")]
    Malformed(String),

    #[error("Envelope is not a JSON object")]
    NotAnObject,

    #[error("Missing kind")]
    MissingKind,

    #[error("Kind is not a string")]
    KindNotString,

    #[error("Missing channel")]
    MissingChannel,

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Missing sequence")]
    MissingSequence,

    #[error("Sequence is not a non-negative integer: {0}")]
    InvalidSequence(String),

    #[error("Missing payload")]
    MissingPayload,

    #[error("Envelope for {envelope} arrived on the {connection} connection")]
    ChannelMismatch { connection: Channel, envelope: Channel },
}

impl Rejection {
    /// Stable label used for the `reason` metric dimension.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Rejection::Malformed(_) => "malformed",
            Rejection::NotAnObject => "not_an_object",
            Rejection::MissingKind => "missing_kind",
            Rejection::KindNotString => "kind_not_string",
            Rejection::MissingChannel => "missing_channel",
            Rejection::UnknownChannel(_) => "unknown_channel",
            Rejection::MissingSequence => "missing_sequence",
            Rejection::InvalidSequence(_) => "invalid_sequence",
            Rejection::MissingPayload => "missing_payload",
            Rejection::ChannelMismatch { .. } => "channel_mismatch",
        }
    }
}

/// Transport-level failures. These end a connection; they never reach
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("Connecting to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Errors returned by manager operations.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("No tokio runtime available to drive the connection")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
