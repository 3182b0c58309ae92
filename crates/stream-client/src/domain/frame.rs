//! Raw inbound frames as delivered by a transport.

/// One message as received from the wire, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame, expected to carry UTF-8 JSON.
    Binary(Vec<u8>),
}

impl InboundFrame {
    /// Size of the frame body in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            InboundFrame::Text(text) => text.len(),
            InboundFrame::Binary(bytes) => bytes.len(),
        }
    }

    /// True for an empty body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for InboundFrame {
    fn from(text: String) -> Self {
        InboundFrame::Text(text)
    }
}

impl From<&str> for InboundFrame {
    fn from(text: &str) -> Self {
        InboundFrame::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for InboundFrame {
    fn from(bytes: Vec<u8>) -> Self {
        InboundFrame::Binary(bytes)
    }
}
