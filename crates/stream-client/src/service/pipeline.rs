//! # Ingestion Pipeline
//!
//! Per frame received on a channel's connection:
//!
//! ```text
//! frame → validate → channel check → sequence observe → gap observers → subscribers
//!            │             │
//!            └── dropped ──┘  (no dispatch, no sequence update, no gap)
//! ```
//!
//! The pipeline holds no transport state. The connection manager decides
//! whether a frame reaches it at all.

use console_telemetry::{
    log_channel_event, STREAM_DISPATCHES, STREAM_GAPS_DETECTED, STREAM_MESSAGES_DROPPED,
    STREAM_MESSAGES_RECEIVED, STREAM_MISSED_SEQUENCES,
};
use parking_lot::Mutex;
use shared_bus::{Disposer, ObserverHandle, ObserverList, SubscriptionRegistry};
use shared_types::{Channel, GapSignal, RawEnvelope};

use crate::domain::{validate_frame, InboundFrame, SequenceTracker};
use crate::error::Rejection;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Delivered to `handlers` subscribers. `gap` is set when the sequence
    /// number was not the expected one; the envelope is delivered anyway.
    Dispatched {
        handlers: usize,
        gap: Option<GapSignal>,
    },
    /// Rejected before dispatch.
    Dropped(Rejection),
    /// Valid, but refused by the caller's admission check.
    NotAdmitted,
}

impl PipelineOutcome {
    /// True if the frame reached the dispatch step.
    #[must_use]
    pub fn is_dispatched(&self) -> bool {
        matches!(self, PipelineOutcome::Dispatched { .. })
    }
}

/// Validation, gap detection and fan-out for every channel.
#[derive(Default)]
pub struct StreamPipeline {
    tracker: Mutex<SequenceTracker>,
    registry: SubscriptionRegistry<Channel, RawEnvelope>,
    gap_observers: ObserverList<GapSignal>,
}

impl StreamPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame received on `channel`'s connection through the pipeline.
    pub fn process(&self, channel: Channel, frame: &InboundFrame) -> PipelineOutcome {
        self.process_admitted(channel, frame, || true)
    }

    /// Like [`process`](Self::process), but `admit` is evaluated under the
    /// sequence lock right before the envelope is observed. A refusal leaves
    /// sequence state untouched; [`reset`](Self::reset) takes the same lock,
    /// so an admitted frame can never leave a baseline behind a reset.
    pub fn process_admitted<A>(&self, channel: Channel, frame: &InboundFrame, admit: A) -> PipelineOutcome
    where
        A: FnOnce() -> bool,
    {
        STREAM_MESSAGES_RECEIVED
            .with_label_values(&[channel.as_str()])
            .inc();

        let envelope = match validate_frame(frame).and_then(|env| check_channel(channel, env)) {
            Ok(envelope) => envelope,
            Err(rejection) => {
                STREAM_MESSAGES_DROPPED
                    .with_label_values(&[channel.as_str(), rejection.reason()])
                    .inc();
                log_channel_event!(
                    debug,
                    channel,
                    "Dropped inbound frame",
                    reason = rejection.reason(),
                    error = %rejection,
                    bytes = frame.len()
                );
                return PipelineOutcome::Dropped(rejection);
            }
        };

        // Lock scope ends before any callback runs.
        let gap = {
            let mut tracker = self.tracker.lock();
            if !admit() {
                return PipelineOutcome::NotAdmitted;
            }
            tracker.observe(channel, envelope.sequence)
        };

        if let Some(gap) = gap {
            STREAM_GAPS_DETECTED
                .with_label_values(&[channel.as_str()])
                .inc();
            STREAM_MISSED_SEQUENCES
                .with_label_values(&[channel.as_str()])
                .inc_by(gap.missed());
            log_channel_event!(
                warn,
                channel,
                "Sequence gap detected",
                expected = gap.expected,
                actual = gap.actual,
                missed = gap.missed()
            );
            self.gap_observers.notify(&gap);
        }

        let handlers = self.registry.dispatch(&channel, &envelope);
        STREAM_DISPATCHES.with_label_values(&[channel.as_str()]).inc();

        PipelineOutcome::Dispatched { handlers, gap }
    }

    /// Convenience for text frames.
    pub fn process_text(&self, channel: Channel, text: &str) -> PipelineOutcome {
        self.process(channel, &InboundFrame::from(text))
    }

    /// Register a handler for every envelope dispatched on `channel`.
    pub fn subscribe<F>(&self, channel: Channel, handler: F) -> Disposer
    where
        F: Fn(&RawEnvelope) + Send + Sync + 'static,
    {
        self.registry.subscribe(channel, handler)
    }

    /// Register an observer for gap signals on any channel.
    pub fn on_gap_detected<F>(&self, observer: F) -> ObserverHandle
    where
        F: Fn(&GapSignal) + Send + Sync + 'static,
    {
        self.gap_observers.register(observer)
    }

    #[must_use]
    pub fn last_accepted(&self, channel: Channel) -> Option<u64> {
        self.tracker.lock().last_accepted(channel)
    }

    /// Forget `channel`'s baseline; its next envelope is not a gap.
    pub fn reset_sequence(&self, channel: Channel) {
        self.tracker.lock().reset(channel);
    }

    /// Clear all sequence state and every subscription. Gap observers stay.
    pub fn reset(&self) {
        self.tracker.lock().clear();
        self.registry.clear();
    }

    #[must_use]
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.registry.handler_count(&channel)
    }

    #[must_use]
    pub fn gap_observer_count(&self) -> usize {
        self.gap_observers.len()
    }
}

impl std::fmt::Debug for StreamPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPipeline")
            .field("subscribers", &self.registry.total_handlers())
            .field("gap_observers", &self.gap_observers.len())
            .finish()
    }
}

fn check_channel(connection: Channel, envelope: RawEnvelope) -> Result<RawEnvelope, Rejection> {
    if envelope.channel == connection {
        Ok(envelope)
    } else {
        Err(Rejection::ChannelMismatch {
            connection,
            envelope: envelope.channel,
        })
    }
}
