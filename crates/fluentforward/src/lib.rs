// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batching core of a fluent forward logs receiver.
//!
//! Decoded forward messages arrive as [`event::Event`]s on an
//! [`channel::EventSender`]. A single [`collector::Collector`] task pulls them
//! off the channel, merges every event that is already queued into one
//! [`logs::LogBatch`], and hands that batch to a [`consumer::LogsConsumer`].
//!
//! ```text
//!   decoder ──> EventChannel ──> Collector (drain + merge) ──> LogsConsumer
//!                                    │
//!                                    └──> ObsReport (records generated, op start/end)
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod channel;
pub mod collector;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod event;
pub mod logs;
pub mod obsreport;
pub mod telemetry;
