//! # Gap Signals
//!
//! A gap is a discontinuity between the next sequence number a channel was
//! expected to deliver and the one actually received. Gaps are diagnostics:
//! the triggering envelope is still delivered to subscribers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// An ephemeral sequence discontinuity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapSignal {
    /// Channel the discontinuity was observed on.
    pub channel: Channel,
    /// Sequence number that should have arrived next. Saturates at
    /// `u64::MAX` when the previous number was already `u64::MAX`.
    pub expected: u64,
    /// Sequence number that actually arrived.
    pub actual: u64,
}

impl GapSignal {
    /// Create a new gap signal.
    #[must_use]
    pub const fn new(channel: Channel, expected: u64, actual: u64) -> Self {
        Self {
            channel,
            expected,
            actual,
        }
    }

    /// Number of sequence numbers skipped over. Zero for regressions.
    #[must_use]
    pub const fn missed(&self) -> u64 {
        self.actual.saturating_sub(self.expected)
    }

    /// True when the received number is a duplicate or arrived out of order.
    #[must_use]
    pub const fn is_regression(&self) -> bool {
        self.actual < self.expected
    }
}

impl fmt::Display for GapSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gap on {}: expected {}, got {}",
            self.channel, self.expected, self.actual
        )
    }
}
