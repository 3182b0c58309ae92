//! Cross-crate integration flows.

pub mod console_flow;
pub mod websocket_flow;
