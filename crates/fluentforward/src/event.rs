// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Events produced by the forward protocol decoder.

use crate::logs::LogRecord;

/// One decoded forward message and the log records it carried.
///
/// Message, Forward and PackedForward modes all decode into this shape; the
/// collector only cares about the records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    tag: Option<String>,
    records: Vec<LogRecord>,
}

impl Event {
    #[must_use]
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { tag: None, records }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Moves every record of this event to the end of `dest`, keeping their order.
    /// The event is left without records.
    pub fn move_records_into(&mut self, dest: &mut Vec<LogRecord>) {
        dest.append(&mut self.records);
    }

    #[must_use]
    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_records_into_appends_in_order_and_empties_event() {
        let mut dest = vec![LogRecord::with_body("existing")];
        let mut event = Event::new(vec![LogRecord::with_body("a"), LogRecord::with_body("b")])
            .with_tag("app.web");

        event.move_records_into(&mut dest);

        assert_eq!(event.record_count(), 0);
        assert_eq!(event.tag(), Some("app.web"));
        let bodies: Vec<_> = dest.iter().map(|r| r.body.as_str().unwrap()).collect();
        assert_eq!(bodies, vec!["existing", "a", "b"]);
    }

    #[test]
    fn test_into_records_hands_over_records() {
        let records = vec![LogRecord::with_body("a"), LogRecord::with_body("b")];
        let event = Event::new(records.clone()).with_tag("app.web");

        assert_eq!(event.into_records(), records);
    }

    #[test]
    fn test_move_records_from_empty_event() {
        let mut dest = Vec::new();
        Event::default().move_records_into(&mut dest);
        assert!(dest.is_empty());
    }
}
