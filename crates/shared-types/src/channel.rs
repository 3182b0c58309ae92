//! # Channels
//!
//! The fixed set of logical streams the console consumes. Each channel is an
//! independently ordered sequence of envelopes carried over its own transport
//! connection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UnknownChannelError;

/// A logical, independently ordered stream of envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Price ticks (`tick`).
    Market,
    /// Portfolio snapshots and risk metrics (`portfolio`, `risk`).
    Portfolio,
    /// Order lifecycle updates and fills (`order`, `fill`).
    Orders,
    /// Alerts and engine status (`alert`, `engine_status`).
    System,
}

impl Channel {
    /// Every known channel, in declaration order.
    pub const ALL: [Channel; 4] = [
        Channel::Market,
        Channel::Portfolio,
        Channel::Orders,
        Channel::System,
    ];

    /// Wire name of the channel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Channel::Market => "market",
            Channel::Portfolio => "portfolio",
            Channel::Orders => "orders",
            Channel::System => "system",
        }
    }

    /// Parse a wire name. Only exact lowercase names are accepted.
    #[must_use]
    pub fn parse(name: &str) -> Option<Channel> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UnknownChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::parse(s).ok_or_else(|| UnknownChannelError(s.to_string()))
    }
}
