//! # Sequence Tracker
//!
//! Remembers the last accepted sequence number per channel and reports
//! discontinuities.
//!
//! - The first observation on a channel is the baseline and never a gap.
//! - Afterwards `expected = last + 1`; any other value is a gap, duplicates
//!   and regressions included.
//! - The received value always becomes the new last-accepted value. The
//!   tracker is forward-only: it never waits for or requests missing numbers.
//! - After `u64::MAX` no number is expected, so every following observation
//!   is a gap. Its `expected` field saturates at `u64::MAX`.

use std::collections::HashMap;

use shared_types::{Channel, GapSignal};

/// Per-channel last-accepted sequence numbers.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last_accepted: HashMap<Channel, u64>,
}

impl SequenceTracker {
    /// Create a tracker with no baselines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sequence` for `channel`, returning a gap if it was not the
    /// expected next number.
    pub fn observe(&mut self, channel: Channel, sequence: u64) -> Option<GapSignal> {
        let previous = self.last_accepted.insert(channel, sequence)?;
        match previous.checked_add(1) {
            Some(expected) if expected == sequence => None,
            Some(expected) => Some(GapSignal::new(channel, expected, sequence)),
            None => Some(GapSignal::new(channel, u64::MAX, sequence)),
        }
    }

    /// Last accepted sequence number, if a baseline exists.
    #[must_use]
    pub fn last_accepted(&self, channel: Channel) -> Option<u64> {
        self.last_accepted.get(&channel).copied()
    }

    /// Next sequence number that would not report a gap. `None` without a
    /// baseline, or once `u64::MAX` has been accepted.
    #[must_use]
    pub fn expected_next(&self, channel: Channel) -> Option<u64> {
        self.last_accepted(channel).and_then(|last| last.checked_add(1))
    }

    /// Forget the baseline for one channel.
    pub fn reset(&mut self, channel: Channel) {
        self.last_accepted.remove(&channel);
    }

    /// Forget every baseline.
    pub fn clear(&mut self) {
        self.last_accepted.clear();
    }
}
