// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use kurbo::Rect;
use trellis_core::trace::{
    DirtyRegionEvent, OverflowEvent, StateEvent, StateEventKind, TraceSink, TransactionEvent,
    ValidateEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    states: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            states: false,
        }
    }

    /// Also prints one line per state invalidation, derivation, and purge.
    #[must_use]
    pub fn with_states(mut self, states: bool) -> Self {
        self.states = states;
        self
    }

    /// Turns per-state lines on or off.
    pub fn set_states(&mut self, states: bool) {
        self.states = states;
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn rect(r: Option<Rect>) -> String {
    match r {
        Some(r) => format!("({:.1},{:.1})-({:.1},{:.1})", r.x0, r.y0, r.x1, r.y1),
        None => "none".into(),
    }
}

fn state_kind(kind: StateEventKind) -> &'static str {
    match kind {
        StateEventKind::Invalidated => "invalidated",
        StateEventKind::Derived => "derived",
        StateEventKind::Purged => "purged",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_transaction(&mut self, e: &TransactionEvent) {
        let _ = writeln!(
            self.writer,
            "[tx] seq={} changes={}",
            e.sequence, e.change_count
        );
    }

    fn on_overflow(&mut self, e: &OverflowEvent) {
        let _ = writeln!(
            self.writer,
            "[overflow] seq={} changes={} threshold={}",
            e.sequence, e.change_count, e.threshold
        );
    }

    fn on_validate(&mut self, e: &ValidateEvent) {
        let _ = writeln!(
            self.writer,
            "[validate] seq={} derived={} states={}",
            e.sequence, e.derived, e.states
        );
    }

    fn on_dirty_region(&mut self, e: &DirtyRegionEvent) {
        let _ = writeln!(
            self.writer,
            "[dirty] seq={} rect={}{}",
            e.sequence,
            rect(e.dirty),
            if e.overflowed { " (overflow)" } else { "" }
        );
    }

    fn on_state(&mut self, e: &StateEvent) {
        if self.states {
            let _ = writeln!(self.writer, "  [state] slot={} {}", e.cell, state_kind(e.kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_event() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_transaction(&TransactionEvent {
            sequence: 4,
            change_count: 2,
        });
        sink.on_dirty_region(&DirtyRegionEvent {
            sequence: 4,
            dirty: Some(Rect::new(0.0, 0.0, 10.5, 20.0)),
            overflowed: false,
        });
        sink.on_dirty_region(&DirtyRegionEvent {
            sequence: 5,
            dirty: None,
            overflowed: true,
        });
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "[tx] seq=4 changes=2\n\
             [dirty] seq=4 rect=(0.0,0.0)-(10.5,20.0)\n\
             [dirty] seq=5 rect=none (overflow)\n"
        );
    }

    #[test]
    fn state_lines_are_opt_in() {
        let event = StateEvent {
            cell: 7,
            kind: StateEventKind::Purged,
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::new());
        quiet.on_state(&event);
        assert!(quiet.into_inner().is_empty());

        let mut loud = PrettyPrintSink::with_writer(Vec::new()).with_states(true);
        loud.on_state(&event);
        assert_eq!(loud.into_inner(), b"  [state] slot=7 purged\n");
    }
}
