//! # Stream Decoders
//!
//! One pure function per message `kind`, each extracting the typed payload
//! from an already validated envelope. Decoders never fail: a payload that
//! does not match its kind's shape decodes to the type's default value. The
//! validator guarantees structure only; payload shape mismatches surface as
//! default data downstream.
//!
//! [`StreamPayload`] is the tagged union over all kinds. Its variants are
//! only ever produced by these decoders.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{
    Alert, EngineStatus, Fill, OrderUpdate, PortfolioSnapshot, PriceTick, RawEnvelope, RiskMetrics,
};
use tracing::debug;

/// Wire names of the known message kinds.
pub mod kinds {
    pub const TICK: &str = "tick";
    pub const PORTFOLIO: &str = "portfolio";
    pub const RISK: &str = "risk";
    pub const ORDER: &str = "order";
    pub const FILL: &str = "fill";
    pub const ALERT: &str = "alert";
    pub const ENGINE_STATUS: &str = "engine_status";
}

fn lenient<T: DeserializeOwned + Default>(envelope: &RawEnvelope) -> T {
    T::deserialize(&envelope.payload).unwrap_or_else(|e| {
        debug!(
            kind = %envelope.kind,
            channel = %envelope.channel,
            sequence = envelope.sequence,
            error = %e,
            "Payload does not match kind, using defaults"
        );
        T::default()
    })
}

/// `tick` → [`PriceTick`]
pub fn decode_tick(envelope: &RawEnvelope) -> PriceTick {
    lenient(envelope)
}

/// `portfolio` → [`PortfolioSnapshot`]
pub fn decode_portfolio(envelope: &RawEnvelope) -> PortfolioSnapshot {
    lenient(envelope)
}

/// `risk` → [`RiskMetrics`]
pub fn decode_risk(envelope: &RawEnvelope) -> RiskMetrics {
    lenient(envelope)
}

/// `order` → [`OrderUpdate`]
pub fn decode_order(envelope: &RawEnvelope) -> OrderUpdate {
    lenient(envelope)
}

/// `fill` → [`Fill`]
pub fn decode_fill(envelope: &RawEnvelope) -> Fill {
    lenient(envelope)
}

/// `alert` → [`Alert`]
pub fn decode_alert(envelope: &RawEnvelope) -> Alert {
    lenient(envelope)
}

/// `engine_status` → [`EngineStatus`]
pub fn decode_engine_status(envelope: &RawEnvelope) -> EngineStatus {
    lenient(envelope)
}

/// Typed payload keyed by the envelope's `kind`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPayload {
    Tick(PriceTick),
    Portfolio(PortfolioSnapshot),
    Risk(RiskMetrics),
    Order(OrderUpdate),
    Fill(Fill),
    Alert(Alert),
    EngineStatus(EngineStatus),
    /// A kind this build does not know. The payload is passed through as is.
    Unknown { kind: String, payload: Value },
}

impl StreamPayload {
    /// Route the envelope to the decoder for its `kind`.
    pub fn decode(envelope: &RawEnvelope) -> Self {
        match envelope.kind.as_str() {
            kinds::TICK => Self::Tick(decode_tick(envelope)),
            kinds::PORTFOLIO => Self::Portfolio(decode_portfolio(envelope)),
            kinds::RISK => Self::Risk(decode_risk(envelope)),
            kinds::ORDER => Self::Order(decode_order(envelope)),
            kinds::FILL => Self::Fill(decode_fill(envelope)),
            kinds::ALERT => Self::Alert(decode_alert(envelope)),
            kinds::ENGINE_STATUS => Self::EngineStatus(decode_engine_status(envelope)),
            other => Self::Unknown {
                kind: other.to_string(),
                payload: envelope.payload.clone(),
            },
        }
    }

    /// Wire name of the payload's kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Tick(_) => kinds::TICK,
            Self::Portfolio(_) => kinds::PORTFOLIO,
            Self::Risk(_) => kinds::RISK,
            Self::Order(_) => kinds::ORDER,
            Self::Fill(_) => kinds::FILL,
            Self::Alert(_) => kinds::ALERT,
            Self::EngineStatus(_) => kinds::ENGINE_STATUS,
            Self::Unknown { kind, .. } => kind,
        }
    }
}
