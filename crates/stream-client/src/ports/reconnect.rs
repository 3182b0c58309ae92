//! Reconnection policies.
//!
//! A closed connection stays closed unless the policy returns a delay for
//! the next attempt. `attempt` counts consecutive failed attempts starting
//! at zero and resets once a connection reaches `Open`.

use std::fmt;
use std::time::Duration;

use shared_types::Channel;

/// Decides whether, and after how long, a closed connection is retried.
pub trait ReconnectPolicy: Send + Sync + fmt::Debug {
    /// Delay before retry number `attempt`, or `None` to stay closed.
    fn next_delay(&self, channel: Channel, attempt: u32) -> Option<Duration>;
}

/// Never reconnect. `Closed` is final.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl ReconnectPolicy for NoReconnect {
    fn next_delay(&self, _channel: Channel, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Maximum exponent applied to the base delay.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Exponential backoff: `min(base * 2^min(attempt, 6), max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Retries allowed before giving up. Counts reset on a successful open.
    pub max_attempts: u32,
}

impl ExponentialBackoff {
    pub const fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max,
            max_attempts,
        }
    }

    /// Delay for `attempt`, ignoring the attempt limit.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_EXPONENT);
        self.base.saturating_mul(factor).min(self.max)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), 10)
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn next_delay(&self, _channel: Channel, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.delay_for(attempt))
    }
}
