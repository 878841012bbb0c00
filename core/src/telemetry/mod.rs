//! telemetry/mod.rs
//! Per-session counters and immutable snapshots.
//!
//! Counters live behind their own short-held lock so `telemetry()` never waits
//! on a reader blocked in the transport.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
