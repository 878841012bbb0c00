// ## src/telemetry/snapshot.rs

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;

/// Immutable view of a session's counters at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub scheme: String,
    pub counters: TelemetryCounters,
    pub overhead_ratio: f64,
    pub elapsed: Duration,
    pub closed: bool,
}

impl TelemetrySnapshot {
    pub fn from(
        scheme: &str,
        counters: &TelemetryCounters,
        opened_at: Instant,
        closed: bool,
    ) -> Self {
        let overhead_ratio = if counters.bytes_plaintext_out > 0 {
            counters.overhead_out() as f64 / counters.bytes_plaintext_out as f64
        } else {
            0.0
        };

        Self {
            scheme: scheme.to_string(),
            counters: counters.clone(),
            overhead_ratio,
            elapsed: opened_at.elapsed(),
            closed,
        }
    }

    /// Internal invariants: wire bytes never undercount plaintext bytes.
    pub fn sanity_check(&self) -> bool {
        self.counters.bytes_wire_out >= self.counters.bytes_plaintext_out
            && self.counters.bytes_wire_in >= self.counters.bytes_plaintext_in
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
