//! In-process transport driven by test code.
//!
//! Each call to [`MemoryTransport::endpoint`] queues one future connection
//! for an address. `open` consumes the oldest queued connection for that
//! address, or fails with "connection refused" when none is queued. The
//! returned [`MemoryEndpoint`] is the server side: whatever it sends is what
//! the client receives, in order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use shared_types::Envelope;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::domain::InboundFrame;
use crate::error::TransportError;
use crate::ports::{InboundStream, Transport};

type FrameResult = Result<InboundFrame, TransportError>;

#[derive(Default)]
struct MemoryInner {
    pending: HashMap<String, VecDeque<mpsc::UnboundedReceiver<FrameResult>>>,
    opened: HashMap<String, usize>,
}

/// Scripted transport. Clones share the same endpoints.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a connection for `address` and return its server side.
    pub fn endpoint(&self, address: impl Into<String>) -> MemoryEndpoint {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .lock()
            .pending
            .entry(address.into())
            .or_default()
            .push_back(rx);
        MemoryEndpoint {
            tx: Mutex::new(Some(tx)),
        }
    }

    /// How many connections to `address` have been opened so far.
    #[must_use]
    pub fn open_count(&self, address: &str) -> usize {
        self.inner.lock().opened.get(address).copied().unwrap_or(0)
    }

    /// Queued connections for `address` not opened yet.
    #[must_use]
    pub fn pending(&self, address: &str) -> usize {
        self.inner.lock().pending.get(address).map_or(0, VecDeque::len)
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryTransport")
            .field("opened", &inner.opened)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, address: &str) -> Result<InboundStream, TransportError> {
        let rx = {
            let mut inner = self.inner.lock();
            let rx = inner
                .pending
                .get_mut(address)
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| TransportError::Connect {
                    address: address.to_string(),
                    reason: "connection refused".to_string(),
                })?;
            *inner.opened.entry(address.to_string()).or_default() += 1;
            rx
        };
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

/// Server side of one in-memory connection.
#[derive(Debug)]
pub struct MemoryEndpoint {
    tx: Mutex<Option<mpsc::UnboundedSender<FrameResult>>>,
}

impl MemoryEndpoint {
    fn push(&self, item: FrameResult) -> bool {
        self.tx
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(item).is_ok())
    }

    /// Send a text frame. Returns false once the client side is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.push(Ok(InboundFrame::Text(text.into())))
    }

    /// Send a binary frame.
    pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) -> bool {
        self.push(Ok(InboundFrame::Binary(bytes.into())))
    }

    /// Serialize and send an envelope as a text frame.
    pub fn send_envelope<T: Serialize>(&self, envelope: &Envelope<T>) -> bool {
        match envelope.to_wire() {
            Ok(text) => self.send_text(text),
            Err(_) => false,
        }
    }

    /// Fail the connection with a protocol error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.push(Err(TransportError::Protocol(reason.into())))
    }

    /// Close from the server side. Frames already sent are still delivered.
    pub fn close(&self) {
        self.tx.lock().take();
    }

    /// Whether the client side still holds the stream (queued or open).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.tx.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }
}
