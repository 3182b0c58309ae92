//! # Operator Console Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Loopback WebSocket server and wait helpers
//! └── integration/      # Cross-crate flows
//!     ├── websocket_flow.rs   # Real sockets through WsTransport
//!     └── console_flow.rs     # Manager + console runtime over memory transport
//! tests/benches/
//! └── stream_benchmarks.rs    # Validator and pipeline throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p console-tests
//! cargo test -p console-tests integration::websocket_flow
//! cargo bench -p console-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
