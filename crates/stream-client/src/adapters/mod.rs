//! Transport adapters.
//!
//! - `websocket`: production transport over tokio-tungstenite
//! - `memory`: scripted in-process transport for tests and demos

pub mod memory;
pub mod websocket;

pub use memory::{MemoryEndpoint, MemoryTransport};
pub use websocket::WsTransport;
