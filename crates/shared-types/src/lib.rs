//! # Shared Types Crate
//!
//! This crate contains the stream envelope contract used by every consumer of
//! the operator console's live data channels.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: channel names, the `Envelope<T>` wire unit and
//!   the typed payloads are defined here and nowhere else.
//! - **Structure Before Meaning**: an `Envelope` only promises its structural
//!   contract (`kind`, `channel`, `sequence`, `payload`). The payload stays an
//!   opaque JSON value until a decoder for its `kind` extracts a typed value.
//! - **Channel Independence**: sequence numbers are scoped to one channel.

pub mod channel;
pub mod connection;
pub mod envelope;
pub mod errors;
pub mod gap;
pub mod payloads;

pub use channel::Channel;
pub use connection::{ConnectionEvent, ConnectionId, ConnectionState};
pub use envelope::{Envelope, RawEnvelope};
pub use errors::*;
pub use gap::GapSignal;
pub use payloads::*;
