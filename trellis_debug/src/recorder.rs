// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording and playback.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event in order.
//! Tests assert on [`events`](RecorderSink::events); tools can
//! [`replay`](RecorderSink::replay) a recording into another sink, such as a
//! [`PrettyPrintSink`](crate::pretty::PrettyPrintSink).

use trellis_core::trace::{
    DirtyRegionEvent, OverflowEvent, StateEvent, StateEventKind, TraceSink, TransactionEvent,
    ValidateEvent,
};

/// A recorded trace event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_transaction`].
    Transaction(TransactionEvent),
    /// See [`TraceSink::on_overflow`].
    Overflow(OverflowEvent),
    /// See [`TraceSink::on_validate`].
    Validate(ValidateEvent),
    /// See [`TraceSink::on_dirty_region`].
    DirtyRegion(DirtyRegionEvent),
    /// See [`TraceSink::on_state`].
    State(StateEvent),
}

/// A [`TraceSink`] that keeps events in memory.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in order.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Drops all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Returns the slots that saw a state event of `kind`, in order.
    #[must_use]
    pub fn slots(&self, kind: StateEventKind) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::State(s) if s.kind == kind => Some(s.cell),
                _ => None,
            })
            .collect()
    }

    /// Returns the dirty-region events in order.
    pub fn dirty_regions(&self) -> impl Iterator<Item = &DirtyRegionEvent> {
        self.events.iter().filter_map(|e| match e {
            RecordedEvent::DirtyRegion(d) => Some(d),
            _ => None,
        })
    }

    /// Feeds every recorded event to `sink`, in order.
    pub fn replay(&self, sink: &mut dyn TraceSink) {
        for event in &self.events {
            match event {
                RecordedEvent::Transaction(e) => sink.on_transaction(e),
                RecordedEvent::Overflow(e) => sink.on_overflow(e),
                RecordedEvent::Validate(e) => sink.on_validate(e),
                RecordedEvent::DirtyRegion(e) => sink.on_dirty_region(e),
                RecordedEvent::State(e) => sink.on_state(e),
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_transaction(&mut self, e: &TransactionEvent) {
        self.events.push(RecordedEvent::Transaction(*e));
    }

    fn on_overflow(&mut self, e: &OverflowEvent) {
        self.events.push(RecordedEvent::Overflow(*e));
    }

    fn on_validate(&mut self, e: &ValidateEvent) {
        self.events.push(RecordedEvent::Validate(*e));
    }

    fn on_dirty_region(&mut self, e: &DirtyRegionEvent) {
        self.events.push(RecordedEvent::DirtyRegion(*e));
    }

    fn on_state(&mut self, e: &StateEvent) {
        self.events.push(RecordedEvent::State(*e));
    }
}
