// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::errors::ConsumeError;
use crate::logs::LogBatch;
use crate::obsreport::LogsOpContext;

/// Downstream sink for batches built by the collector.
///
/// Called sequentially from the single collector task. A returned error is
/// recorded and the batch is dropped; it is never retried.
#[async_trait]
pub trait LogsConsumer: Send + Sync {
    async fn consume_logs(&self, ctx: &LogsOpContext, batch: LogBatch)
        -> Result<(), ConsumeError>;
}
