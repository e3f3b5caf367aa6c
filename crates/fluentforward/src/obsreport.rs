// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bookkeeping around each call into the downstream consumer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info_span, warn, Span};

use crate::errors::ConsumeError;
use crate::telemetry::{NoopTelemetry, ReceiverTelemetry};

/// Format name reported for batches built from forward protocol events.
pub const FORMAT: &str = "fluent";

const DEFAULT_TRANSPORT: &str = "tcp";

/// Context of one logs operation, created by [`ObsReport::start_logs_op`].
///
/// The consumer receives it alongside the batch; work done under [`Self::span`]
/// is attributed to the receiver that produced the batch.
#[derive(Debug, Clone)]
pub struct LogsOpContext {
    span: Span,
    started_at: Instant,
}

impl LogsOpContext {
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Observability wrapper for one receiver instance.
pub struct ObsReport {
    receiver_id: String,
    transport: String,
    telemetry: Arc<dyn ReceiverTelemetry>,
}

impl ObsReport {
    pub fn new(receiver_id: impl Into<String>, telemetry: Arc<dyn ReceiverTelemetry>) -> Self {
        Self {
            receiver_id: receiver_id.into(),
            transport: DEFAULT_TRANSPORT.to_string(),
            telemetry,
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.transport = transport.into();
        self
    }

    #[must_use]
    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    /// Counts records merged into a batch. Emitted before forwarding, so it
    /// reflects generated volume, not delivered volume.
    pub fn record_records_generated(&self, count: usize) {
        self.telemetry.on_records_generated(count as u64);
    }

    pub fn start_logs_op(&self) -> LogsOpContext {
        LogsOpContext {
            span: info_span!(
                "receiver_logs_op",
                receiver = %self.receiver_id,
                transport = %self.transport
            ),
            started_at: Instant::now(),
        }
    }

    pub fn end_logs_op(
        &self,
        ctx: LogsOpContext,
        format: &str,
        num_records: usize,
        err: Option<&ConsumeError>,
    ) {
        let elapsed = ctx.elapsed();
        let _entered = ctx.span.enter();
        match err {
            None => {
                self.telemetry.on_logs_accepted(num_records as u64);
                debug!(
                    "Forwarded {num_records} {format} log records in {}us",
                    elapsed.as_micros()
                );
            }
            Some(err) => {
                self.telemetry.on_logs_refused(num_records as u64, err);
                warn!(
                    "Failed to forward {num_records} {format} log records (permanent: {}): {err}",
                    err.is_permanent()
                );
            }
        }
    }
}

impl Default for ObsReport {
    fn default() -> Self {
        Self::new("fluentforward", Arc::new(NoopTelemetry))
    }
}

impl std::fmt::Debug for ObsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObsReport")
            .field("receiver_id", &self.receiver_id)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::CountingTelemetry;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_end_logs_op_success_counts_accepted() {
        let telemetry = CountingTelemetry::default();
        let obsreport = ObsReport::new("fluentforward/test", Arc::new(telemetry.clone()));

        let ctx = obsreport.start_logs_op();
        obsreport.end_logs_op(ctx, FORMAT, 5, None);

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.accepted_log_records, 5);
        assert_eq!(snapshot.refused_log_records, 0);
        assert!(logs_contain("Forwarded 5 fluent log records"));
    }

    #[test]
    #[traced_test]
    fn test_end_logs_op_failure_counts_refused_and_warns() {
        let telemetry = CountingTelemetry::default();
        let obsreport = ObsReport::new("fluentforward/test", Arc::new(telemetry.clone()))
            .with_transport("udp");

        let ctx = obsreport.start_logs_op();
        let err = ConsumeError::Rejected("bad batch".to_string());
        obsreport.end_logs_op(ctx, FORMAT, 3, Some(&err));

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.refused_log_records, 3);
        assert_eq!(snapshot.refused_batches, 1);
        assert_eq!(snapshot.accepted_log_records, 0);
        assert!(logs_contain("Failed to forward 3 fluent log records (permanent: true)"));
        assert!(logs_contain("bad batch"));
    }

    #[test]
    fn test_record_records_generated() {
        let telemetry = CountingTelemetry::default();
        let obsreport = ObsReport::new("fluentforward", Arc::new(telemetry.clone()));

        obsreport.record_records_generated(6);

        assert_eq!(telemetry.snapshot().records_generated, 6);
        assert_eq!(telemetry.snapshot().batches_generated, 1);
    }

    #[test]
    fn test_receiver_id_and_debug() {
        let obsreport = ObsReport::new("fluentforward/edge", Arc::new(CountingTelemetry::default()));

        assert_eq!(obsreport.receiver_id(), "fluentforward/edge");
        assert!(format!("{obsreport:?}").contains("fluentforward/edge"));
    }
}
