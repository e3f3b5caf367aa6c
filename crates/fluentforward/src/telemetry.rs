// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Telemetry hooks for the receiver.
//!
//! [`ReceiverTelemetry`] is the metric sink behind [`crate::obsreport::ObsReport`].
//! Every hook has a no-op default so implementations only override what they
//! export. [`CountingTelemetry`] keeps atomic counters that callers can expose
//! through statsd, OpenTelemetry or any other backend.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::ConsumeError;

pub trait ReceiverTelemetry: Send + Sync {
    /// Called once per batch with the number of records merged into it,
    /// before the batch is forwarded.
    fn on_records_generated(&self, _count: u64) {}
    /// Called when the downstream consumer accepted a batch.
    fn on_logs_accepted(&self, _count: u64) {}
    /// Called when the downstream consumer failed to take a batch.
    fn on_logs_refused(&self, _count: u64, _error: &ConsumeError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl ReceiverTelemetry for NoopTelemetry {}

/// Counters updated by [`CountingTelemetry`] (all values use relaxed atomics).
#[derive(Debug, Default)]
pub struct TelemetryCounters {
    records_generated: AtomicU64,
    batches_generated: AtomicU64,
    accepted_log_records: AtomicU64,
    refused_log_records: AtomicU64,
    refused_batches: AtomicU64,
}

impl TelemetryCounters {
    /// Captures a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            records_generated: self.records_generated.load(Ordering::Relaxed),
            batches_generated: self.batches_generated.load(Ordering::Relaxed),
            accepted_log_records: self.accepted_log_records.load(Ordering::Relaxed),
            refused_log_records: self.refused_log_records.load(Ordering::Relaxed),
            refused_batches: self.refused_batches.load(Ordering::Relaxed),
        }
    }
}

/// Plain data representation of [`TelemetryCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Records merged into batches, counted before forwarding.
    pub records_generated: u64,
    /// Batches built by the collector.
    pub batches_generated: u64,
    /// Records the downstream consumer accepted.
    pub accepted_log_records: u64,
    /// Records in batches the downstream consumer failed to take.
    pub refused_log_records: u64,
    /// Batches the downstream consumer failed to take.
    pub refused_batches: u64,
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "records_generated={}, batches_generated={}, accepted_log_records={}, refused_log_records={}, refused_batches={}",
            self.records_generated,
            self.batches_generated,
            self.accepted_log_records,
            self.refused_log_records,
            self.refused_batches
        )
    }
}

#[derive(Debug, Clone)]
pub struct CountingTelemetry {
    counters: Arc<TelemetryCounters>,
}

impl CountingTelemetry {
    pub fn new(counters: Arc<TelemetryCounters>) -> Self {
        Self { counters }
    }

    pub fn counters(&self) -> Arc<TelemetryCounters> {
        Arc::clone(&self.counters)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.counters.snapshot()
    }
}

impl Default for CountingTelemetry {
    fn default() -> Self {
        Self::new(Arc::new(TelemetryCounters::default()))
    }
}

impl ReceiverTelemetry for CountingTelemetry {
    fn on_records_generated(&self, count: u64) {
        self.counters
            .records_generated
            .fetch_add(count, Ordering::Relaxed);
        self.counters
            .batches_generated
            .fetch_add(1, Ordering::Relaxed);
    }

    fn on_logs_accepted(&self, count: u64) {
        self.counters
            .accepted_log_records
            .fetch_add(count, Ordering::Relaxed);
    }

    fn on_logs_refused(&self, count: u64, _error: &ConsumeError) {
        self.counters
            .refused_log_records
            .fetch_add(count, Ordering::Relaxed);
        self.counters.refused_batches.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forwards every hook to a list of observers, in insertion order.
#[derive(Default)]
pub struct CompositeTelemetry {
    observers: Vec<Arc<dyn ReceiverTelemetry>>,
}

impl CompositeTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, telemetry: Arc<dyn ReceiverTelemetry>) -> Self {
        self.observers.push(telemetry);
        self
    }
}

impl fmt::Debug for CompositeTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeTelemetry")
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

impl ReceiverTelemetry for CompositeTelemetry {
    fn on_records_generated(&self, count: u64) {
        for observer in &self.observers {
            observer.on_records_generated(count);
        }
    }

    fn on_logs_accepted(&self, count: u64) {
        for observer in &self.observers {
            observer.on_logs_accepted(count);
        }
    }

    fn on_logs_refused(&self, count: u64, error: &ConsumeError) {
        for observer in &self.observers {
            observer.on_logs_refused(count, error);
        }
    }
}
