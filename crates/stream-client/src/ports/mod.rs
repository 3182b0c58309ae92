//! Ports: the seams between the ingestion core and the outside world.

pub mod reconnect;
pub mod transport;

pub use reconnect::{ExponentialBackoff, NoReconnect, ReconnectPolicy};
pub use transport::{InboundStream, Transport};
