//! # Channel Connection Manager
//!
//! Owns one transport connection per channel and routes every frame they
//! deliver through the shared [`StreamPipeline`].
//!
//! ```text
//! Idle ──connect()──→ Connecting ──open──→ Open ──error/close──→ Closed
//!                          ↑                                      │
//!                          └──────── reconnect policy delay ──────┘
//! ```
//!
//! Each `connect` spawns one task that drives the connection. Frames are
//! processed in delivery order on that task, and only while the channel's slot
//! is `Open` and still owned by the connection that received them. A new
//! `connect` for the same channel replaces the old connection.
//!
//! Instances are independent: nothing is global except metrics.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use console_telemetry::{log_channel_event, STREAM_CHANNEL_STATE};
use futures_util::StreamExt;
use parking_lot::Mutex;
use shared_bus::{Disposer, ObserverHandle};
use shared_types::{Channel, ConnectionEvent, ConnectionId, ConnectionState, GapSignal, RawEnvelope};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::adapters::WsTransport;
use crate::config::StreamConfig;
use crate::domain::InboundFrame;
use crate::error::StreamError;
use crate::ports::{NoReconnect, ReconnectPolicy, Transport};
use crate::service::pipeline::{PipelineOutcome, StreamPipeline};

/// Default buffer of the state event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

struct ChannelSlot {
    connection_id: ConnectionId,
    state: ConnectionState,
    address: String,
    task: Option<JoinHandle<()>>,
}

struct ManagerInner {
    pipeline: StreamPipeline,
    slots: Mutex<HashMap<Channel, ChannelSlot>>,
    events: broadcast::Sender<ConnectionEvent>,
    transport: Arc<dyn Transport>,
    reconnect: Arc<dyn ReconnectPolicy>,
}

impl ManagerInner {
    fn emit(&self, channel: Channel, connection_id: ConnectionId, state: ConnectionState) {
        STREAM_CHANNEL_STATE
            .with_label_values(&[channel.as_str()])
            .set(state_code(state));
        // No receivers is fine.
        let _ = self.events.send(ConnectionEvent {
            channel,
            connection_id,
            state,
        });
    }

    /// Move `channel` to `state` if `connection_id` still owns the slot.
    fn transition(&self, channel: Channel, connection_id: ConnectionId, state: ConnectionState) -> bool {
        {
            let mut slots = self.slots.lock();
            match slots.get_mut(&channel) {
                Some(slot) if slot.connection_id == connection_id => slot.state = state,
                _ => return false,
            }
        }
        self.emit(channel, connection_id, state);
        true
    }

    fn owns_open_slot(&self, channel: Channel, connection_id: ConnectionId) -> bool {
        self.slots.lock().get(&channel).is_some_and(|slot| {
            slot.connection_id == connection_id && slot.state.accepts_messages()
        })
    }

    /// Process a frame if the connection still owns an open slot. Returns
    /// false when the connection has been superseded or closed.
    ///
    /// Ownership is checked again under the pipeline's sequence lock, which
    /// `close_all` also takes after draining the slots. Lock order is
    /// sequence tracker, then slots.
    fn ingest(&self, channel: Channel, connection_id: ConnectionId, frame: &InboundFrame) -> bool {
        if !self.owns_open_slot(channel, connection_id) {
            return false;
        }
        let outcome = self
            .pipeline
            .process_admitted(channel, frame, || self.owns_open_slot(channel, connection_id));
        outcome != PipelineOutcome::NotAdmitted
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        for slot in self.slots.get_mut().values_mut() {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
        }
    }
}

/// Cloneable handle to a set of channel connections.
#[derive(Clone)]
pub struct ChannelConnectionManager {
    inner: Arc<ManagerInner>,
}

impl ChannelConnectionManager {
    /// Manager over `transport` that never reconnects.
    pub fn new(transport: impl Transport) -> Self {
        Self::with_options(Arc::new(transport), Arc::new(NoReconnect), DEFAULT_EVENT_CAPACITY)
    }

    /// Manager with an explicit reconnection policy and event buffer size.
    pub fn with_options(
        transport: Arc<dyn Transport>,
        reconnect: Arc<dyn ReconnectPolicy>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(ManagerInner {
                pipeline: StreamPipeline::new(),
                slots: Mutex::new(HashMap::new()),
                events,
                transport,
                reconnect,
            }),
        }
    }

    /// WebSocket manager without reconnection.
    #[must_use]
    pub fn websocket() -> Self {
        Self::new(WsTransport::new())
    }

    /// WebSocket manager configured from `config`. The config is validated
    /// first; no connection is opened.
    pub fn from_config(config: &StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let mut transport = WsTransport::new();
        if let Some(timeout) = config.connect_timeout {
            transport = transport.with_connect_timeout(timeout);
        }
        Ok(Self::with_options(
            Arc::new(transport),
            config.reconnect_policy(),
            config.event_capacity,
        ))
    }

    /// Open a connection for `channel` at `address`, replacing any existing
    /// one. Returns as soon as the connection task is spawned; the channel is
    /// `Connecting` at that point.
    pub fn connect(&self, channel: Channel, address: impl Into<String>) -> Result<ConnectionId, StreamError> {
        let runtime = Handle::try_current().map_err(|_| StreamError::NoRuntime)?;
        let address = address.into();
        let connection_id = Uuid::new_v4();

        let previous = self.inner.slots.lock().insert(
            channel,
            ChannelSlot {
                connection_id,
                state: ConnectionState::Connecting,
                address: address.clone(),
                task: None,
            },
        );

        if let Some(previous) = previous {
            if let Some(task) = previous.task {
                task.abort();
            }
            log_channel_event!(
                info,
                channel,
                "Replacing channel connection",
                old_connection = %previous.connection_id,
                old_address = %previous.address
            );
            self.inner
                .emit(channel, previous.connection_id, ConnectionState::Closed);
        }

        self.inner
            .emit(channel, connection_id, ConnectionState::Connecting);
        log_channel_event!(info, channel, "Connecting", connection = %connection_id, address = %address);

        let span = info_span!("stream_connection", %channel, connection = %connection_id);
        let task = runtime.spawn(
            run_connection(Arc::downgrade(&self.inner), channel, connection_id, address).instrument(span),
        );

        let mut slots = self.inner.slots.lock();
        match slots.get_mut(&channel) {
            Some(slot) if slot.connection_id == connection_id => slot.task = Some(task),
            // Replaced concurrently before the handle was stored.
            _ => task.abort(),
        }

        Ok(connection_id)
    }

    /// Register an observer for sequence gaps on every channel.
    pub fn on_gap_detected<F>(&self, observer: F) -> ObserverHandle
    where
        F: Fn(&GapSignal) + Send + Sync + 'static,
    {
        self.inner.pipeline.on_gap_detected(observer)
    }

    /// Register a handler for validated envelopes on `channel`.
    pub fn subscribe<F>(&self, channel: Channel, handler: F) -> Disposer
    where
        F: Fn(&RawEnvelope) + Send + Sync + 'static,
    {
        self.inner.pipeline.subscribe(channel, handler)
    }

    /// Close every connection and forget all channel state.
    ///
    /// Sequence baselines and subscriptions are cleared; gap observers stay
    /// registered. Afterwards every channel reports `Idle`.
    pub fn close_all(&self) {
        let drained: Vec<(Channel, ChannelSlot)> = self.inner.slots.lock().drain().collect();
        let closed = drained.len();

        for (channel, mut slot) in drained {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            self.inner
                .emit(channel, slot.connection_id, ConnectionState::Closed);
            STREAM_CHANNEL_STATE
                .with_label_values(&[channel.as_str()])
                .set(state_code(ConnectionState::Idle));
        }

        self.inner.pipeline.reset();
        info!(closed, "All channel connections closed");
    }

    /// Current state of `channel`. `Idle` if never connected.
    #[must_use]
    pub fn state(&self, channel: Channel) -> ConnectionState {
        self.inner
            .slots
            .lock()
            .get(&channel)
            .map_or(ConnectionState::Idle, |slot| slot.state)
    }

    /// Id of the connection currently owning `channel`.
    #[must_use]
    pub fn connection_id(&self, channel: Channel) -> Option<ConnectionId> {
        self.inner.slots.lock().get(&channel).map(|slot| slot.connection_id)
    }

    /// Receive every subsequent state transition.
    #[must_use]
    pub fn state_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn last_accepted(&self, channel: Channel) -> Option<u64> {
        self.inner.pipeline.last_accepted(channel)
    }

    /// Forget `channel`'s sequence baseline.
    pub fn reset_sequence(&self, channel: Channel) {
        self.inner.pipeline.reset_sequence(channel);
    }

    /// Channels whose connection is currently `Open`, in channel order.
    #[must_use]
    pub fn open_channels(&self) -> Vec<Channel> {
        let mut open: Vec<Channel> = self
            .inner
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.state == ConnectionState::Open)
            .map(|(channel, _)| *channel)
            .collect();
        open.sort_unstable();
        open
    }

    #[must_use]
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.inner.pipeline.subscriber_count(channel)
    }
}

impl std::fmt::Debug for ChannelConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConnectionManager")
            .field("open_channels", &self.open_channels())
            .field("pipeline", &self.inner.pipeline)
            .field("reconnect", &self.inner.reconnect)
            .finish()
    }
}

/// Gauge value for a state: 0 idle, 1 connecting, 2 open, 3 closed.
fn state_code(state: ConnectionState) -> i64 {
    match state {
        ConnectionState::Idle => 0,
        ConnectionState::Connecting => 1,
        ConnectionState::Open => 2,
        ConnectionState::Closed => 3,
    }
}

/// Drive one connection until it is closed for good or superseded.
///
/// Holds only a weak reference so that dropping the last manager handle ends
/// the task.
async fn run_connection(
    inner: Weak<ManagerInner>,
    channel: Channel,
    connection_id: ConnectionId,
    address: String,
) {
    let mut attempt: u32 = 0;

    loop {
        let Some(transport) = inner.upgrade().map(|i| i.transport.clone()) else {
            return;
        };

        match transport.open(&address).await {
            Ok(mut stream) => {
                match inner.upgrade() {
                    Some(i) if i.transition(channel, connection_id, ConnectionState::Open) => {}
                    _ => return,
                }
                attempt = 0;
                log_channel_event!(info, channel, "Channel open", address = %address);

                let failure = loop {
                    match stream.next().await {
                        Some(Ok(frame)) => {
                            let Some(i) = inner.upgrade() else { return };
                            if !i.ingest(channel, connection_id, &frame) {
                                return;
                            }
                        }
                        Some(Err(e)) => break Some(e),
                        None => break None,
                    }
                };

                match failure {
                    Some(error) => {
                        log_channel_event!(warn, channel, "Connection failed", error = %error)
                    }
                    None => log_channel_event!(info, channel, "Connection closed by remote"),
                }
            }
            Err(error) => {
                log_channel_event!(warn, channel, "Connect failed", error = %error, attempt);
            }
        }

        let delay = {
            let Some(i) = inner.upgrade() else { return };
            if !i.transition(channel, connection_id, ConnectionState::Closed) {
                return;
            }
            i.reconnect.next_delay(channel, attempt)
        };
        let Some(delay) = delay else {
            return;
        };

        attempt = attempt.saturating_add(1);
        log_channel_event!(info, channel, "Reconnecting", attempt, delay = ?delay);
        tokio::time::sleep(delay).await;

        match inner.upgrade() {
            Some(i) if i.transition(channel, connection_id, ConnectionState::Connecting) => {}
            _ => return,
        }
    }
}
