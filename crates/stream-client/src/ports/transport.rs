//! Transport port.
//!
//! A transport opens one inbound message stream per address. The stream
//! yields frames in delivery order; its end means the remote side closed the
//! connection, an `Err` item means the connection failed.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::domain::InboundFrame;
use crate::error::TransportError;

/// Inbound frames of one open connection.
pub type InboundStream = Pin<Box<dyn Stream<Item = Result<InboundFrame, TransportError>> + Send>>;

/// Opens push-stream connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connect to `address`. Resolves once the connection is ready to
    /// deliver frames.
    async fn open(&self, address: &str) -> Result<InboundStream, TransportError>;
}
