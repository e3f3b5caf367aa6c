// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::event::Event;

/// Error returned by a [`crate::consumer::LogsConsumer`] that failed to take a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsumeError {
    /// The batch will never be accepted, e.g. it failed downstream validation.
    #[error("batch rejected by consumer: {0}")]
    Rejected(String),
    /// The consumer could not take the batch right now.
    #[error("consumer unavailable: {0}")]
    Unavailable(String),
}

impl ConsumeError {
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Error returned when an event could not be queued. The event is handed back.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("event channel closed")]
    Closed(Event),
    #[error("event channel full")]
    Full(Event),
}

impl SendError {
    #[must_use]
    pub fn into_event(self) -> Event {
        match self {
            Self::Closed(event) | Self::Full(event) => event,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}
