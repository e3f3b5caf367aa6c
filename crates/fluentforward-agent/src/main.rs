// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use fluentforward::{
    channel::{event_channel, EventSender},
    collector::Collector,
    config::Config,
    consumer::LogsConsumer,
    errors::ConsumeError,
    event::Event,
    logs::{LogBatch, LogRecord},
    obsreport::{LogsOpContext, ObsReport},
    telemetry::CountingTelemetry,
};

/// Writes every batch as one JSON line on stdout.
struct StdoutConsumer {
    stdout: TokioMutex<tokio::io::Stdout>,
}

#[async_trait]
impl LogsConsumer for StdoutConsumer {
    async fn consume_logs(
        &self,
        _ctx: &LogsOpContext,
        batch: LogBatch,
    ) -> Result<(), ConsumeError> {
        let mut line =
            serde_json::to_vec(&batch).map_err(|e| ConsumeError::Rejected(e.to_string()))?;
        line.push(b'\n');

        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(&line)
            .await
            .map_err(|e| ConsumeError::Unavailable(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| ConsumeError::Unavailable(e.to_string()))
    }
}

#[tokio::main]
pub async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading fluentforward agent configuration: {e}");
            return;
        }
    };

    let env_filter = format!("h2=off,hyper=off,{}", config.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let telemetry = CountingTelemetry::default();
    let obsreport = Arc::new(
        ObsReport::new(config.receiver_id.clone(), Arc::new(telemetry.clone()))
            .with_transport("stdin"),
    );

    let (event_tx, event_rx) = event_channel(config.channel_capacity);
    let consumer = Arc::new(StdoutConsumer {
        stdout: TokioMutex::new(tokio::io::stdout()),
    });

    info!(
        "fluentforward agent {} starting: channel_capacity={:?}, max_batch_records={:?}",
        obsreport.receiver_id(),
        config.channel_capacity,
        config.max_batch_records
    );

    let cancel_token = CancellationToken::new();
    let mut collector_handle = Collector::new(
        event_rx,
        consumer,
        info_span!("collector", receiver = %config.receiver_id),
        obsreport,
    )
    .with_max_batch_records(config.max_batch_records)
    .start(cancel_token.clone());

    if let Err(e) = spawn_stdin_reader(event_tx) {
        error!("Failed to start stdin reader: {e}");
        cancel_token.cancel();
    }

    // Once stdin hits EOF the reader drops its sender, so the collector
    // forwards what is left and stops when the channel is empty.
    let result = tokio::select! {
        result = &mut collector_handle => result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {e}");
            }
            debug!("Shutdown signal received");
            cancel_token.cancel();
            collector_handle.await
        }
    };
    if let Err(e) = result {
        error!("Collector task failed: {e}");
    }

    info!("fluentforward agent stopped: {}", telemetry.snapshot());
}

/// Reads stdin on a plain thread. A blocking read there cannot hold up
/// runtime shutdown, so the process exits on Ctrl-C even with stdin open.
fn spawn_stdin_reader(event_tx: EventSender) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("fluentforward-stdin".to_string())
        .spawn(move || {
            read_events(std::io::stdin().lock(), &event_tx);
            debug!("stdin closed");
        })
}

/// Turns newline-delimited JSON into events. A JSON object is one record; an
/// array of objects is one event carrying several records. Returns once the
/// input ends or the collector is gone.
fn read_events(input: impl BufRead, event_tx: &EventSender) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {e}");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed input line: {e}");
                continue;
            }
        };

        if let Err(e) = event_tx.blocking_send(event) {
            debug!("Stopped reading input: {e}");
            return;
        }
    }
}

fn parse_event(line: &str) -> Result<Event, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let records = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<LogRecord>, _>>()?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(Event::new(records).with_tag("stdin"))
}
