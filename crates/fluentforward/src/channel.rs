// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Queue between the protocol decoder and the collector.
//!
//! A bounded channel makes producers wait in [`EventSender::send`] once it is
//! full, so a slow downstream consumer pushes back into the decoder instead
//! of piling up in memory. An unbounded channel never blocks producers.

use tokio::sync::mpsc;

use crate::errors::SendError;
use crate::event::Event;
use crate::logs::LogRecord;

/// Creates an event channel. `None` or `Some(0)` means unbounded.
#[must_use]
pub fn event_channel(capacity: Option<usize>) -> (EventSender, EventReceiver) {
    match capacity {
        Some(capacity) if capacity > 0 => {
            let (tx, rx) = mpsc::channel(capacity);
            (EventSender::Bounded(tx), EventReceiver::Bounded(rx))
        }
        _ => {
            let (tx, rx) = mpsc::unbounded_channel();
            (EventSender::Unbounded(tx), EventReceiver::Unbounded(rx))
        }
    }
}

/// Producer half. Cheap to clone; hand one to every decoder task.
#[derive(Debug, Clone)]
pub enum EventSender {
    Bounded(mpsc::Sender<Event>),
    Unbounded(mpsc::UnboundedSender<Event>),
}

impl EventSender {
    /// Queues an event, waiting for room if the channel is bounded and full.
    pub async fn send(&self, event: Event) -> Result<(), SendError> {
        match self {
            EventSender::Bounded(tx) => tx.send(event).await.map_err(|e| SendError::Closed(e.0)),
            EventSender::Unbounded(tx) => tx.send(event).map_err(|e| SendError::Closed(e.0)),
        }
    }

    /// Queues an event from a plain thread, blocking it while a bounded
    /// channel is full. Must not be called from inside the async runtime.
    pub fn blocking_send(&self, event: Event) -> Result<(), SendError> {
        match self {
            EventSender::Bounded(tx) => tx.blocking_send(event).map_err(|e| SendError::Closed(e.0)),
            EventSender::Unbounded(tx) => tx.send(event).map_err(|e| SendError::Closed(e.0)),
        }
    }

    /// Queues an event without waiting.
    pub fn try_send(&self, event: Event) -> Result<(), SendError> {
        match self {
            EventSender::Bounded(tx) => tx.try_send(event).map_err(|e| match e {
                mpsc::error::TrySendError::Full(event) => SendError::Full(event),
                mpsc::error::TrySendError::Closed(event) => SendError::Closed(event),
            }),
            EventSender::Unbounded(tx) => tx.send(event).map_err(|e| SendError::Closed(e.0)),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            EventSender::Bounded(tx) => tx.is_closed(),
            EventSender::Unbounded(tx) => tx.is_closed(),
        }
    }
}

/// Consumer half, owned by the collector.
#[derive(Debug)]
pub enum EventReceiver {
    Bounded(mpsc::Receiver<Event>),
    Unbounded(mpsc::UnboundedReceiver<Event>),
}

impl EventReceiver {
    /// Waits for the next event. `None` once every sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Event> {
        match self {
            EventReceiver::Bounded(rx) => rx.recv().await,
            EventReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Takes the next event only if one is already queued.
    pub fn try_recv(&mut self) -> Result<Event, mpsc::error::TryRecvError> {
        match self {
            EventReceiver::Bounded(rx) => rx.try_recv(),
            EventReceiver::Unbounded(rx) => rx.try_recv(),
        }
    }

    /// Moves the records of every event that is ready right now into `dest`.
    ///
    /// Returns as soon as the channel has nothing queued, without waiting. With
    /// `max_records` set, stops pulling events once `dest` holds at least that
    /// many records; events are never split. Returns the number of events taken.
    pub fn drain_into(&mut self, dest: &mut Vec<LogRecord>, max_records: Option<usize>) -> usize {
        let mut drained = 0;
        loop {
            if max_records.is_some_and(|max| dest.len() >= max) {
                return drained;
            }
            match self.try_recv() {
                Ok(mut event) => {
                    event.move_records_into(dest);
                    drained += 1;
                }
                // Empty or Disconnected: either way nothing more is ready.
                Err(_) => return drained,
            }
        }
    }
}
