//! # Envelope Validator
//!
//! Structural contract check applied to every inbound message before it is
//! trusted. Checks run in a fixed order and the first failure rejects the
//! whole envelope:
//!
//! 1. the frame decodes to JSON
//! 2. the value is an object
//! 3. `kind` is present and is a string
//! 4. `channel` is present and names a known channel
//! 5. `sequence` is present and is an integer `>= 0`
//! 6. `payload` is present (any value, `null` included)
//!
//! Payload shape is NOT checked here; that belongs to the decoder for the
//! envelope's `kind`. Validation is pure and never panics.

use serde_json::{Map, Value};
use shared_types::{Channel, RawEnvelope};

use crate::domain::frame::InboundFrame;
use crate::error::Rejection;

/// Validate a raw transport frame.
pub fn validate_frame(frame: &InboundFrame) -> Result<RawEnvelope, Rejection> {
    let decoded = match frame {
        InboundFrame::Text(text) => serde_json::from_str::<Value>(text),
        InboundFrame::Binary(bytes) => serde_json::from_slice::<Value>(bytes),
    };
    let value = decoded.map_err(|e| Rejection::Malformed(e.to_string()))?;
    validate_value(value)
}

/// Validate JSON text.
pub fn validate_str(text: &str) -> Result<RawEnvelope, Rejection> {
    let value = serde_json::from_str::<Value>(text).map_err(|e| Rejection::Malformed(e.to_string()))?;
    validate_value(value)
}

/// Validate an already decoded value.
pub fn validate_value(value: Value) -> Result<RawEnvelope, Rejection> {
    let Value::Object(mut fields) = value else {
        return Err(Rejection::NotAnObject);
    };

    let kind = take_kind(&mut fields)?;
    let channel = read_channel(&fields)?;
    let sequence = read_sequence(&fields)?;
    let payload = fields.remove("payload").ok_or(Rejection::MissingPayload)?;

    Ok(RawEnvelope {
        kind,
        channel,
        sequence,
        payload,
    })
}

fn take_kind(fields: &mut Map<String, Value>) -> Result<String, Rejection> {
    match fields.remove("kind") {
        None => Err(Rejection::MissingKind),
        Some(Value::String(kind)) => Ok(kind),
        Some(_) => Err(Rejection::KindNotString),
    }
}

fn read_channel(fields: &Map<String, Value>) -> Result<Channel, Rejection> {
    match fields.get("channel") {
        None => Err(Rejection::MissingChannel),
        Some(Value::String(name)) => {
            Channel::parse(name).ok_or_else(|| Rejection::UnknownChannel(name.clone()))
        }
        Some(other) => Err(Rejection::UnknownChannel(other.to_string())),
    }
}

fn read_sequence(fields: &Map<String, Value>) -> Result<u64, Rejection> {
    let value = fields.get("sequence").ok_or(Rejection::MissingSequence)?;
    // Only JSON integers qualify: `1.0`, `-1` and `"1"` are all rejected.
    value
        .as_u64()
        .ok_or_else(|| Rejection::InvalidSequence(value.to_string()))
}
