//! # Stream Wiring
//!
//! Connects the channel manager to the live state:
//!
//! ```text
//! ChannelConnectionManager ──envelope──→ StreamPayload::decode ──→ LiveState::apply
//!            │                                                          ↑
//!            ├──gap──────────────────────────────→ LiveState::record_gap│
//!            └──state event──→ event task ────────→ LiveState::record_state
//! ```
//!
//! One subscription per channel. Handlers only take the state lock for the
//! duration of a single update.

use anyhow::{Context, Result};
use shared_bus::{Disposer, ObserverHandle};
use shared_types::{Channel, ConnectionEvent, ConnectionState};
use stream_client::{ChannelConnectionManager, StreamConfig, StreamPayload};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::state::{LiveState, SharedState};

/// The console's connection to its live data channels.
pub struct ConsoleRuntime {
    manager: ChannelConnectionManager,
    state: SharedState,
    subscriptions: Vec<Disposer>,
    gap_observer: ObserverHandle,
    event_task: JoinHandle<()>,
}

impl ConsoleRuntime {
    /// Wire `manager` to a fresh live state. Must be called inside a tokio
    /// runtime; no connection is opened yet.
    pub fn new(manager: ChannelConnectionManager) -> Self {
        let state = LiveState::shared();

        let gap_state = state.clone();
        let gap_observer = manager.on_gap_detected(move |gap| {
            warn!(
                channel = %gap.channel,
                expected = gap.expected,
                actual = gap.actual,
                "Live data gap, views may be stale"
            );
            gap_state.write().record_gap(gap);
        });

        // Subscribe before any connect so no transition is missed.
        let event_task = tokio::spawn(track_states(manager.state_events(), state.clone()));

        let mut runtime = Self {
            manager,
            state,
            subscriptions: Vec::new(),
            gap_observer,
            event_task,
        };
        runtime.subscribe_all();
        runtime
    }

    /// Wire a WebSocket manager built from `config`.
    pub fn from_config(config: &StreamConfig) -> Result<Self> {
        let manager = ChannelConnectionManager::from_config(config)
            .context("Failed to build channel connection manager")?;
        Ok(Self::new(manager))
    }

    fn subscribe_all(&mut self) {
        for channel in Channel::ALL {
            let state = self.state.clone();
            let disposer = self.manager.subscribe(channel, move |envelope| {
                let payload = StreamPayload::decode(envelope);
                state.write().apply(payload);
            });
            self.subscriptions.push(disposer);
        }
    }

    /// Open a connection for every configured channel.
    pub fn start(&self, config: &StreamConfig) -> Result<()> {
        for &channel in &config.channels {
            let address = config.address_for(channel);
            self.manager
                .connect(channel, address)
                .with_context(|| format!("Failed to connect {channel}"))?;
        }
        info!(channels = config.channels.len(), base_url = %config.base_url, "Console streams started");
        Ok(())
    }

    /// Close every channel, then restore subscriptions so the runtime can be
    /// started again.
    pub fn restart_cycle(&mut self) {
        self.manager.close_all();
        self.subscriptions.clear();
        self.subscribe_all();
    }

    /// Close every channel and stop tracking state.
    pub fn shutdown(self) {
        info!("Shutting down console streams...");
        for disposer in &self.subscriptions {
            disposer.dispose();
        }
        self.gap_observer.dispose();
        self.manager.close_all();
        self.event_task.abort();
        info!("Console streams closed");
    }

    pub fn manager(&self) -> &ChannelConnectionManager {
        &self.manager
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }
}

/// Mirror connection transitions into the live state.
async fn track_states(mut events: broadcast::Receiver<ConnectionEvent>, state: SharedState) {
    loop {
        match events.recv().await {
            Ok(event) => {
                match event.state {
                    ConnectionState::Closed => {
                        warn!(channel = %event.channel, connection = %event.connection_id, "Channel closed")
                    }
                    other => {
                        info!(channel = %event.channel, connection = %event.connection_id, state = %other, "Channel state changed")
                    }
                }
                state.write().record_state(event.channel, event.state);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Connection state events lagged");
            }
            Err(RecvError::Closed) => return,
        }
    }
}
