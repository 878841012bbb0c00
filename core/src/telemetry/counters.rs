// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters kept by a live session.
//!
//! Summary: Collects record counts and byte counts per direction plus failure
//! tallies. Converted into an immutable TelemetrySnapshot on demand.
use std::ops::AddAssign;
use serde::{Deserialize, Serialize};

/// Deterministic counters collected during session I/O
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub records_sealed: u64,
    pub records_opened: u64,
    pub bytes_plaintext_out: u64,
    pub bytes_plaintext_in: u64,
    pub bytes_wire_out: u64,
    pub bytes_wire_in: u64,
    pub integrity_failures: u64,
    /// Fatal transport errors; each one closes the session.
    pub transport_failures: u64,
    /// Recoverable transport errors (timed out, would block, interrupted).
    pub transient_failures: u64,
    /// Subset of `transient_failures` that were timeouts.
    pub timeouts: u64,
    pub write_retries: u64,
}

impl TelemetryCounters {
    /// Record one write that reached the transport in full.
    ///
    /// - `records`: records sealed into the block
    /// - `pt_len`: caller plaintext bytes
    /// - `wire_len`: encoded bytes handed to the transport
    pub fn add_write(&mut self, records: u64, pt_len: usize, wire_len: usize) {
        self.records_sealed += records;
        self.bytes_plaintext_out += pt_len as u64;
        self.bytes_wire_out += wire_len as u64;
    }

    /// Record one record decoded from the transport.
    pub fn add_read(&mut self, pt_len: usize, wire_len: usize) {
        self.records_opened += 1;
        self.bytes_plaintext_in += pt_len as u64;
        self.bytes_wire_in += wire_len as u64;
    }

    pub fn add_integrity_failure(&mut self) {
        self.integrity_failures += 1;
    }

    pub fn add_transport_failure(&mut self) {
        self.transport_failures += 1;
    }

    /// Record a transport error the session survived.
    pub fn add_transient_failure(&mut self, timed_out: bool) {
        self.transient_failures += 1;
        if timed_out {
            self.timeouts += 1;
        }
    }

    pub fn add_write_retry(&mut self) {
        self.write_retries += 1;
    }

    /// Bytes spent on framing + tags for outbound data.
    pub fn overhead_out(&self) -> u64 {
        self.bytes_wire_out.saturating_sub(self.bytes_plaintext_out)
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.records_sealed += other.records_sealed;
        self.records_opened += other.records_opened;
        self.bytes_plaintext_out += other.bytes_plaintext_out;
        self.bytes_plaintext_in += other.bytes_plaintext_in;
        self.bytes_wire_out += other.bytes_wire_out;
        self.bytes_wire_in += other.bytes_wire_in;
        self.integrity_failures += other.integrity_failures;
        self.transport_failures += other.transport_failures;
        self.transient_failures += other.transient_failures;
        self.timeouts += other.timeouts;
        self.write_retries += other.write_retries;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
