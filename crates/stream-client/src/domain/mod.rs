//! Domain layer: pure logic, no I/O.
//!
//! - `frame`: raw transport payloads
//! - `validator`: structural envelope contract
//! - `sequence`: per-channel gap detection
//! - `decoders`: typed payload extraction per `kind`

pub mod decoders;
pub mod frame;
pub mod sequence;
pub mod validator;

pub use decoders::{kinds, StreamPayload};
pub use frame::InboundFrame;
pub use sequence::SequenceTracker;
pub use validator::{validate_frame, validate_str, validate_value};
