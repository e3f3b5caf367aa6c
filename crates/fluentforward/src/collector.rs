// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector turning queued forward events into log batches.
//!
//! Building a [`LogBatch`] per event is wasteful when the decoder produces
//! events faster than the consumer takes them. The collector instead takes
//! the first available event, then pulls every other event that is *already*
//! queued into the same batch before forwarding. It never waits for more
//! events once the channel is empty, so a lone event is not delayed.
//!
//! ```text
//!   EventChannel: [E1][E2][E3]          (queued while the consumer was busy)
//!                   │   │   │
//!                   v   v   v
//!   LogBatch:     resource ─ scope ─ [E1 records.., E2 records.., E3 records..]
//! ```
//!
//! Only one collector task runs per channel, so batch state needs no locks.
//! While the consumer is busy, events accumulate in the channel; a bounded
//! channel then blocks producers.
//!
//! Delivery is best effort: a consumer error is recorded through
//! [`ObsReport::end_logs_op`] and the batch is dropped.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, Instrument, Span};

use crate::channel::EventReceiver;
use crate::consumer::LogsConsumer;
use crate::event::Event;
use crate::logs::LogBatch;
use crate::obsreport::{ObsReport, FORMAT};

pub struct Collector {
    next_consumer: Arc<dyn LogsConsumer>,
    events: EventReceiver,
    logger: Span,
    obsreport: Arc<ObsReport>,
    max_batch_records: Option<usize>,
}

impl Collector {
    /// `logger` is the span every collector diagnostic is emitted under.
    #[must_use]
    pub fn new(
        events: EventReceiver,
        next_consumer: Arc<dyn LogsConsumer>,
        logger: Span,
        obsreport: Arc<ObsReport>,
    ) -> Self {
        Self {
            next_consumer,
            events,
            logger,
            obsreport,
            max_batch_records: None,
        }
    }

    /// Stops merging queued events into a batch once it holds `max` records.
    /// Events are never split, so a batch can exceed `max` by one event.
    #[must_use]
    pub fn with_max_batch_records(mut self, max: Option<usize>) -> Self {
        self.max_batch_records = max.filter(|m| *m > 0);
        self
    }

    /// Spawns the processing loop and returns immediately.
    ///
    /// The loop exits when `cancel_token` is cancelled or every sender is
    /// dropped. Events still queued at that point are dropped. Awaiting the
    /// returned handle is optional.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        let logger = self.logger.clone();
        tokio::spawn(self.process_events(cancel_token).instrument(logger))
    }

    async fn process_events(mut self, cancel_token: CancellationToken) {
        debug!("Collector started");
        loop {
            let event = tokio::select! {
                biased;
                () = cancel_token.cancelled() => {
                    debug!("Collector cancelled, queued events are dropped");
                    return;
                }
                event = self.events.recv() => event,
            };

            let Some(event) = event else {
                debug!("Event channel closed, collector stopped");
                return;
            };

            let batch = self.build_batch(event);
            self.forward(batch).await;
        }
    }

    fn build_batch(&mut self, mut first: Event) -> LogBatch {
        let mut records = Vec::with_capacity(first.record_count());
        first.move_records_into(&mut records);

        // Pull out anything already waiting so one batch covers all of it.
        let drained = self
            .events
            .drain_into(&mut records, self.max_batch_records);
        trace!(
            "Merged {} events into a batch of {} records",
            drained + 1,
            records.len()
        );

        LogBatch::from_records(records)
    }

    async fn forward(&self, batch: LogBatch) {
        let num_records = batch.log_record_count();
        self.obsreport.record_records_generated(num_records);

        let ctx = self.obsreport.start_logs_op();
        let result = self
            .next_consumer
            .consume_logs(&ctx, batch)
            .instrument(ctx.span().clone())
            .await;
        self.obsreport
            .end_logs_op(ctx, FORMAT, num_records, result.err().as_ref());
    }
}
