//! # Connection Lifecycle
//!
//! ```text
//! Idle ──connect()──→ Connecting ──ready──→ Open ──error/close──→ Closed
//! ```
//!
//! Inbound messages are only processed while a connection is `Open`.
//! `Closed` is terminal for a connection unless a reconnection policy
//! schedules another attempt.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::Channel;

/// Identifies one `connect` call. Reconnect attempts reuse the id.
pub type ConnectionId = Uuid;

/// Transport handle state for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection has been requested.
    #[default]
    Idle,
    /// Handshake in flight.
    Connecting,
    /// Ready; inbound messages are processed.
    Open,
    /// Failed or closed; no messages are processed.
    Closed,
}

impl ConnectionState {
    /// Whether inbound messages are processed in this state.
    #[must_use]
    pub const fn accepts_messages(self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A state transition of one channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// Channel whose connection changed state.
    pub channel: Channel,
    /// The `connect` call the transition belongs to.
    pub connection_id: ConnectionId,
    /// New state.
    pub state: ConnectionState,
}
