// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use fluentforward::{
    channel::event_channel,
    collector::Collector,
    consumer::LogsConsumer,
    errors::ConsumeError,
    event::Event,
    logs::{LogBatch, LogRecord},
    obsreport::{LogsOpContext, ObsReport},
    telemetry::CountingTelemetry,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct SlowConsumer {
    received: Mutex<Vec<LogBatch>>,
}

#[async_trait]
impl LogsConsumer for SlowConsumer {
    async fn consume_logs(
        &self,
        _ctx: &LogsOpContext,
        batch: LogBatch,
    ) -> Result<(), ConsumeError> {
        // Give producers time to queue up behind the collector.
        sleep(Duration::from_millis(2)).await;
        self.received.lock().unwrap().push(batch);
        Ok(())
    }
}

const PRODUCERS: usize = 4;
const EVENTS_PER_PRODUCER: usize = 50;
const RECORDS_PER_EVENT: usize = 3;
const TOTAL_RECORDS: usize = PRODUCERS * EVENTS_PER_PRODUCER * RECORDS_PER_EVENT;

fn record(producer: usize, seq: usize) -> LogRecord {
    let mut record = LogRecord::with_body(format!("p{producer}-{seq}"));
    record
        .attributes
        .insert("producer".to_string(), producer.into());
    record.attributes.insert("seq".to_string(), seq.into());
    record
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn collector_batches_concurrent_producers_in_order() {
    let (tx, rx) = event_channel(Some(16));
    let consumer = Arc::new(SlowConsumer::default());
    let telemetry = CountingTelemetry::default();
    let obsreport = Arc::new(ObsReport::new(
        "fluentforward/integration",
        Arc::new(telemetry.clone()),
    ));

    let cancel_token = CancellationToken::new();
    let collector_handle = Collector::new(
        rx,
        Arc::clone(&consumer) as Arc<dyn LogsConsumer>,
        tracing::Span::none(),
        obsreport,
    )
    .start(cancel_token.clone());

    let mut producers = Vec::new();
    for producer in 0..PRODUCERS {
        let tx = tx.clone();
        producers.push(tokio::spawn(async move {
            let mut seq = 0;
            for _ in 0..EVENTS_PER_PRODUCER {
                let records = (0..RECORDS_PER_EVENT)
                    .map(|_| {
                        seq += 1;
                        record(producer, seq)
                    })
                    .collect();
                tx.send(Event::new(records).with_tag(format!("app.{producer}")))
                    .await
                    .expect("collector went away");
            }
        }));
    }
    for producer in producers {
        producer.await.expect("producer panicked");
    }

    let wait_for_all = async {
        while telemetry.snapshot().accepted_log_records < TOTAL_RECORDS as u64 {
            sleep(Duration::from_millis(10)).await;
        }
    };
    timeout(Duration::from_secs(10), wait_for_all)
        .await
        .expect("timed out before every record was forwarded");

    cancel_token.cancel();
    timeout(Duration::from_secs(2), collector_handle)
        .await
        .expect("collector did not stop")
        .expect("collector panicked");

    let batches = consumer.received.lock().unwrap();
    let total: usize = batches.iter().map(LogBatch::log_record_count).sum();
    assert_eq!(total, TOTAL_RECORDS);
    // A slow consumer with concurrent producers leaves events queued, which get merged.
    assert!(batches.len() < PRODUCERS * EVENTS_PER_PRODUCER);

    let mut last_seq: HashMap<u64, u64> = HashMap::new();
    for record in batches.iter().flat_map(LogBatch::log_records) {
        let producer = record.attributes["producer"].as_u64().unwrap();
        let seq = record.attributes["seq"].as_u64().unwrap();
        let previous = last_seq.insert(producer, seq).unwrap_or(0);
        assert_eq!(seq, previous + 1, "records of producer {producer} out of order");
    }

    let snapshot = telemetry.snapshot();
    assert_eq!(snapshot.records_generated, TOTAL_RECORDS as u64);
    assert_eq!(snapshot.batches_generated, batches.len() as u64);
    assert_eq!(snapshot.refused_batches, 0);
}

#[tokio::test]
async fn collector_start_returns_without_blocking() {
    let (_tx, rx) = event_channel(None);
    let consumer: Arc<dyn LogsConsumer> = Arc::new(SlowConsumer::default());
    let cancel_token = CancellationToken::new();

    let obsreport = Arc::new(ObsReport::default());
    let handle =
        Collector::new(rx, consumer, tracing::Span::none(), obsreport).start(cancel_token.clone());
    assert!(!handle.is_finished());

    cancel_token.cancel();
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("collector did not stop")
        .expect("collector panicked");
}
