//! Live console state.
//!
//! Mutable views the dashboard renders from. Every update arrives as a
//! decoded [`StreamPayload`]; connection transitions and gaps are recorded
//! alongside so the operator can tell stale data from live data.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use shared_types::{
    Alert, Channel, ConnectionState, EngineStatus, Fill, GapSignal, OrderUpdate, PortfolioSnapshot,
    PriceTick, RiskMetrics,
};
use stream_client::StreamPayload;

/// Maximum fills kept.
pub const MAX_FILLS: usize = 200;

/// Maximum alerts kept.
pub const MAX_ALERTS: usize = 100;

/// Maximum entries in the event log.
pub const MAX_EVENTS: usize = 100;

/// State shared between stream handlers and readers.
pub type SharedState = Arc<RwLock<LiveState>>;

/// An entry in the console's event log.
#[derive(Debug, Clone)]
pub struct LiveEvent {
    /// When the event was recorded.
    pub timestamp: Instant,
    /// Short category, e.g. `gap` or `market`.
    pub event_type: String,
    pub description: String,
}

/// Everything the console currently knows.
#[derive(Debug, Default)]
pub struct LiveState {
    /// Latest tick per symbol.
    pub prices: HashMap<String, PriceTick>,
    pub portfolio: Option<PortfolioSnapshot>,
    pub risk: Option<RiskMetrics>,
    /// Latest update per order id.
    pub orders: HashMap<String, OrderUpdate>,
    /// Most recent first.
    pub fills: VecDeque<Fill>,
    /// Most recent first.
    pub alerts: VecDeque<Alert>,
    pub engine: Option<EngineStatus>,
    pub channel_states: HashMap<Channel, ConnectionState>,
    /// Gaps seen per channel since start.
    pub gaps: HashMap<Channel, u64>,
    /// Payloads with a kind this build does not handle.
    pub unknown_kinds: u64,
    /// Most recent first.
    pub live_events: VecDeque<LiveEvent>,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state behind a shared lock.
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Fold one decoded payload into the views.
    pub fn apply(&mut self, payload: StreamPayload) {
        match payload {
            StreamPayload::Tick(tick) => {
                self.prices.insert(tick.symbol.clone(), tick);
            }
            StreamPayload::Portfolio(snapshot) => self.portfolio = Some(snapshot),
            StreamPayload::Risk(risk) => self.risk = Some(risk),
            StreamPayload::Order(order) => {
                self.orders.insert(order.order_id.clone(), order);
            }
            StreamPayload::Fill(fill) => {
                self.fills.push_front(fill);
                self.fills.truncate(MAX_FILLS);
            }
            StreamPayload::Alert(alert) => {
                let description = format!("[{}] {}", alert.severity, alert.message);
                self.add_event("alert", &description);
                self.alerts.push_front(alert);
                self.alerts.truncate(MAX_ALERTS);
            }
            StreamPayload::EngineStatus(status) => {
                if self.engine.as_ref().map(|s| s.engine_state) != Some(status.engine_state) {
                    self.add_event("engine", &format!("Engine {:?} ({:?})", status.engine_state, status.mode));
                }
                self.engine = Some(status);
            }
            StreamPayload::Unknown { .. } => self.unknown_kinds += 1,
        }
    }

    /// Record a sequence gap.
    pub fn record_gap(&mut self, gap: &GapSignal) {
        *self.gaps.entry(gap.channel).or_default() += 1;
        self.add_event("gap", &gap.to_string());
    }

    /// Record a connection state transition.
    pub fn record_state(&mut self, channel: Channel, state: ConnectionState) {
        let previous = self.channel_states.insert(channel, state);
        if previous != Some(state) {
            self.add_event(channel.as_str(), &format!("Connection {state}"));
        }
    }

    /// Whether every channel in `channels` is currently open.
    pub fn all_open(&self, channels: &[Channel]) -> bool {
        channels
            .iter()
            .all(|c| self.channel_states.get(c) == Some(&ConnectionState::Open))
    }

    /// Total gaps across all channels.
    pub fn total_gaps(&self) -> u64 {
        self.gaps.values().sum()
    }

    fn add_event(&mut self, event_type: &str, description: &str) {
        self.live_events.push_front(LiveEvent {
            timestamp: Instant::now(),
            event_type: event_type.to_string(),
            description: description.to_string(),
        });
        self.live_events.truncate(MAX_EVENTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{EngineState, Mode};

    fn tick(symbol: &str, price: f64) -> StreamPayload {
        StreamPayload::Tick(PriceTick {
            symbol: symbol.into(),
            price,
            ..Default::default()
        })
    }

    #[test]
    fn test_latest_tick_wins() {
        let mut state = LiveState::new();
        state.apply(tick("ES", 1.0));
        state.apply(tick("ES", 2.0));
        state.apply(tick("NQ", 3.0));

        assert_eq!(state.prices.len(), 2);
        assert_eq!(state.prices["ES"].price, 2.0);
    }

    #[test]
    fn test_orders_keyed_by_id() {
        let mut state = LiveState::new();
        for status in ["NEW", "PARTIAL", "FILLED"] {
            state.apply(StreamPayload::Order(OrderUpdate {
                order_id: "o-1".into(),
                status: status.into(),
                ..Default::default()
            }));
        }
        assert_eq!(state.orders.len(), 1);
        assert_eq!(state.orders["o-1"].status, "FILLED");
    }

    #[test]
    fn test_fills_are_bounded() {
        let mut state = LiveState::new();
        for i in 0..(MAX_FILLS + 10) {
            state.apply(StreamPayload::Fill(Fill {
                timestamp: i as u64,
                ..Default::default()
            }));
        }
        assert_eq!(state.fills.len(), MAX_FILLS);
        assert_eq!(state.fills.front().map(|f| f.timestamp), Some((MAX_FILLS + 9) as u64));
    }

    #[test]
    fn test_engine_change_is_logged_once() {
        let mut state = LiveState::new();
        let status = EngineStatus {
            mode: Mode::Live,
            engine_state: EngineState::Running,
            kill_switch_active: false,
        };
        state.apply(StreamPayload::EngineStatus(status));
        state.apply(StreamPayload::EngineStatus(status));

        assert_eq!(state.live_events.len(), 1);
        assert_eq!(state.engine, Some(status));
    }

    #[test]
    fn test_gaps_and_states() {
        let mut state = LiveState::new();
        state.record_gap(&GapSignal::new(Channel::Market, 2, 5));
        state.record_gap(&GapSignal::new(Channel::Market, 6, 9));
        state.record_state(Channel::Market, ConnectionState::Open);
        state.record_state(Channel::Orders, ConnectionState::Closed);

        assert_eq!(state.gaps[&Channel::Market], 2);
        assert_eq!(state.total_gaps(), 2);
        assert!(state.all_open(&[Channel::Market]));
        assert!(!state.all_open(&[Channel::Market, Channel::Orders]));
        assert_eq!(
            state.live_events.front().map(|e| e.description.as_str()),
            Some("Connection closed")
        );
    }

    #[test]
    fn test_unknown_kind_is_counted() {
        let mut state = LiveState::new();
        state.apply(StreamPayload::Unknown {
            kind: "heartbeat".into(),
            payload: serde_json::Value::Null,
        });
        assert_eq!(state.unknown_kinds, 1);
    }
}
