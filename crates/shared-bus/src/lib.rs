//! # Shared Bus - Synchronous Fan-Out for Stream Consumers
//!
//! Delivers every validated envelope on a channel to each consumer that asked
//! for it, without the producer knowing who those consumers are.
//!
//! ```text
//!                  ┌───────────────────────┐
//!   dispatch() ──→ │ SubscriptionRegistry  │ ──→ handler 1
//!                  │  key → [h1, h2, h3]   │ ──→ handler 2
//!                  └───────────────────────┘ ──→ handler 3
//!                            ↑
//!                 subscribe() → Disposer
//! ```
//!
//! ## Delivery Rules
//!
//! - Handlers run synchronously, in registration order.
//! - A dispatch iterates a snapshot: handlers added or disposed from inside a
//!   handler take effect from the next dispatch.
//! - A `Disposer` removes exactly the handler it was issued for. Disposing twice
//!   is a no-op, and ids are never reused, so a stale disposer can never remove
//!   a handler registered later.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod observers;
pub mod registry;

pub use observers::{ObserverHandle, ObserverList};
pub use registry::{Disposer, Handler, SubscriberId, SubscriptionRegistry};
