// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;

use crate::errors::ConfigError;

const DEFAULT_RECEIVER_ID: &str = "fluentforward";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub receiver_id: String,
    /// Capacity of the event channel; `None` means unbounded.
    pub channel_capacity: Option<usize>,
    /// Soft cap on records merged into one batch; `None` means no cap.
    pub max_batch_records: Option<usize>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receiver_id: DEFAULT_RECEIVER_ID.to_string(),
            channel_capacity: None,
            max_batch_records: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let receiver_id = env::var("FLUENTFORWARD_RECEIVER_ID")
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_RECEIVER_ID.to_string());

        let log_level = env::var("FLUENTFORWARD_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

        Ok(Config {
            receiver_id,
            channel_capacity: non_zero(parse_env::<usize>("FLUENTFORWARD_CHANNEL_CAPACITY")?),
            max_batch_records: non_zero(parse_env::<usize>("FLUENTFORWARD_MAX_BATCH_RECORDS")?),
            log_level,
        })
    }
}

fn parse_env<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}

// Zero is accepted as an explicit "no limit".
fn non_zero(value: Option<usize>) -> Option<usize> {
    value.filter(|v| *v > 0)
}
