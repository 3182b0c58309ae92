//! WebSocket transport.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{future, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use crate::domain::InboundFrame;
use crate::error::TransportError;
use crate::ports::{InboundStream, Transport};

/// Opens one WebSocket per address and forwards its data frames.
///
/// Text and binary messages become [`InboundFrame`]s. A close frame ends the
/// stream; ping, pong and raw frames are skipped.
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    connect_timeout: Option<Duration>,
}

impl WsTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the handshake with [`TransportError::Timeout`] after `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

fn to_frame(message: Result<Message, tokio_tungstenite::tungstenite::Error>) -> Option<Result<InboundFrame, TransportError>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(InboundFrame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(data)) => Some(Ok(InboundFrame::Binary(data.to_vec()))),
        Ok(_) => None,
        Err(e) => Some(Err(TransportError::Protocol(e.to_string()))),
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, address: &str) -> Result<InboundStream, TransportError> {
        let handshake = connect_async(address);
        let result = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, handshake)
                .await
                .map_err(|_| TransportError::Timeout {
                    address: address.to_string(),
                    timeout,
                })?,
            None => handshake.await,
        };

        let (ws, response) = result.map_err(|e| TransportError::Connect {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        debug!(address, status = %response.status(), "WebSocket handshake complete");

        let frames = ws
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| future::ready(to_frame(msg)));
        Ok(Box::pin(frames))
    }
}
