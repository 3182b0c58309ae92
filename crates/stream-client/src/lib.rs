//! # Stream Client - Real-Time Ingestion Core
//!
//! Receives push messages on several independent channels, validates their
//! envelopes, detects sequence gaps per channel and fans each envelope out to
//! the consumers subscribed to that channel.
//!
//! ## Architecture
//!
//! ```text
//! Transport (ws / memory)            ChannelConnectionManager
//!   market    ──frames──→ ┐         ┌──────────────────────────────┐
//!   portfolio ──frames──→ ├───────→ │ validate → observe → dispatch │ ──→ subscribers
//!   orders    ──frames──→ │         └──────────────┬───────────────┘
//!   system    ──frames──→ ┘                        └──→ gap observers
//! ```
//!
//! - `domain`: validator, sequence tracker, decoders (pure)
//! - `ports`: transport and reconnection policy traits
//! - `adapters`: WebSocket and in-memory transports
//! - `service`: ingestion pipeline and connection manager
//!
//! ## Guarantees
//!
//! - Per channel, frames are processed in delivery order.
//! - A frame that fails validation is dropped: no dispatch, no sequence
//!   update, no gap signal.
//! - A gap never blocks delivery; the envelope that revealed it is still
//!   dispatched.
//!
//! ## Example
//!
//! ```rust,ignore
//! use stream_client::{ChannelConnectionManager, StreamPayload};
//! use shared_types::Channel;
//!
//! let manager = ChannelConnectionManager::websocket();
//! manager.on_gap_detected(|gap| tracing::warn!(%gap, "resync needed"));
//! let sub = manager.subscribe(Channel::Market, |env| {
//!     if let StreamPayload::Tick(tick) = StreamPayload::decode(env) {
//!         println!("{} {}", tick.symbol, tick.price);
//!     }
//! });
//! manager.connect(Channel::Market, "ws://localhost:8765/stream/market")?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{MemoryEndpoint, MemoryTransport, WsTransport};
pub use config::{ConfigError, ReconnectConfig, StreamConfig};
pub use domain::decoders::{
    decode_alert, decode_engine_status, decode_fill, decode_order, decode_portfolio, decode_risk,
    decode_tick,
};
pub use domain::{kinds, validate_frame, validate_str, validate_value, InboundFrame, SequenceTracker, StreamPayload};
pub use error::{Rejection, StreamError, TransportError};
pub use ports::{ExponentialBackoff, InboundStream, NoReconnect, ReconnectPolicy, Transport};
pub use service::manager::DEFAULT_EVENT_CAPACITY;
pub use service::{ChannelConnectionManager, PipelineOutcome, StreamPipeline};
