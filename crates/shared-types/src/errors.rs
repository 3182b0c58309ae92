//! # Error Types
//!
//! Defines error types used across the shared contract.

use thiserror::Error;

/// A channel name outside the fixed set of known channels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown channel: {0}")]
pub struct UnknownChannelError(pub String);
