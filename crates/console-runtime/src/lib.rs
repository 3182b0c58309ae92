//! # Console Runtime Library
//!
//! Exposes the runtime's wiring for tests. The entry point is the
//! `console-runtime` binary.
//!
//! - `state`: live views fed by decoded stream payloads
//! - `wiring`: subscriptions, gap observer and connection lifecycle

pub mod state;
pub mod wiring;

pub use state::{LiveEvent, LiveState, SharedState};
pub use wiring::ConsoleRuntime;
