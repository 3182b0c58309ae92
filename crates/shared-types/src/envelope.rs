//! # `Envelope` Wire Unit
//!
//! Every message pushed on a channel travels as an envelope:
//!
//! ```json
//! { "kind": "tick", "channel": "market", "sequence": 42, "payload": { ... } }
//! ```
//!
//! - `kind` discriminates the payload shape.
//! - `channel` names the logical stream the sender published on.
//! - `sequence` is assigned by the sender and increases by exactly one per
//!   message within a channel. Violations are detected downstream, never
//!   prevented here.
//! - `payload` is opaque until a decoder keyed on `kind` extracts it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::Channel;

/// A structurally valid stream message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    /// Payload shape discriminator.
    pub kind: String,
    /// Logical stream the message belongs to.
    pub channel: Channel,
    /// Sender-assigned, per-channel sequence number.
    pub sequence: u64,
    /// Message body.
    pub payload: T,
}

/// An envelope whose payload has not been decoded yet.
pub type RawEnvelope = Envelope<Value>;

impl<T> Envelope<T> {
    /// Create a new envelope.
    pub fn new(kind: impl Into<String>, channel: Channel, sequence: u64, payload: T) -> Self {
        Self {
            kind: kind.into(),
            channel,
            sequence,
            payload,
        }
    }

    /// Replace the payload, keeping the header fields.
    pub fn map_payload<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            kind: self.kind,
            channel: self.channel,
            sequence: self.sequence,
            payload: f(self.payload),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encode as the JSON text sent on the wire.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
