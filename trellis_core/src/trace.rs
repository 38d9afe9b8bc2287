// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for change propagation.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! view calls at each stage of consuming a change log. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! These events are for tooling (see `trellis_debug`). Human-readable
//! diagnostics go through the `tracing` crate instead.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates per-state [`StateEvent`]s and the
//!   corresponding `TraceSink` method.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Rect;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the view starts consuming a closed transaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransactionEvent {
    /// Sequence number of the edit.
    pub sequence: u64,
    /// Number of change records in the edit.
    pub change_count: usize,
}

/// Emitted when a change log is too long for per-record dirty tracking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverflowEvent {
    /// Sequence number of the edit.
    pub sequence: u64,
    /// Number of change records in the edit.
    pub change_count: usize,
    /// The configured threshold that was exceeded.
    pub threshold: usize,
}

/// Emitted after the view has revalidated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidateEvent {
    /// Sequence number of the edit.
    pub sequence: u64,
    /// States derived during this validation.
    pub derived: u64,
    /// Live states after validation.
    pub states: usize,
}

/// Emitted with the aggregated dirty region of one transaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirtyRegionEvent {
    /// Sequence number of the edit.
    pub sequence: u64,
    /// Region to repaint, or `None` if nothing changed visually.
    pub dirty: Option<Rect>,
    /// Whether the threshold valve replaced per-record tracking.
    pub overflowed: bool,
}

/// What happened to a cached state.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateEventKind {
    /// The state's `invalid` flag was raised.
    Invalidated,
    /// The state was (re)derived.
    Derived,
    /// The state was dropped from the cache.
    Purged,
}

/// A per-state cache event.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateEvent {
    /// Slot index of the cell.
    pub cell: u32,
    /// What happened.
    pub kind: StateEventKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the view.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a closed transaction reaches the view.
    fn on_transaction(&mut self, e: &TransactionEvent) {
        _ = e;
    }

    /// Called when the threshold valve triggers.
    fn on_overflow(&mut self, e: &OverflowEvent) {
        _ = e;
    }

    /// Called after revalidation.
    fn on_validate(&mut self, e: &ValidateEvent) {
        _ = e;
    }

    /// Called with the aggregated dirty region.
    fn on_dirty_region(&mut self, e: &DirtyRegionEvent) {
        _ = e;
    }

    /// Called for every state invalidation, derivation, and purge (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_state(&mut self, e: &StateEvent) {
        _ = e;
    }
}

/// Shared sinks, so a caller can keep reading a sink it handed to a graph.
impl<T: TraceSink + ?Sized> TraceSink for Rc<RefCell<T>> {
    fn on_transaction(&mut self, e: &TransactionEvent) {
        self.borrow_mut().on_transaction(e);
    }

    fn on_overflow(&mut self, e: &OverflowEvent) {
        self.borrow_mut().on_overflow(e);
    }

    fn on_validate(&mut self, e: &ValidateEvent) {
        self.borrow_mut().on_validate(e);
    }

    fn on_dirty_region(&mut self, e: &DirtyRegionEvent) {
        self.borrow_mut().on_dirty_region(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_state(&mut self, e: &StateEvent) {
        self.borrow_mut().on_state(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TransactionEvent`].
    #[inline]
    pub fn transaction(&mut self, e: &TransactionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transaction(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OverflowEvent`].
    #[inline]
    pub fn overflow(&mut self, e: &OverflowEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_overflow(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ValidateEvent`].
    #[inline]
    pub fn validate(&mut self, e: &ValidateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_validate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DirtyRegionEvent`].
    #[inline]
    pub fn dirty_region(&mut self, e: &DirtyRegionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dirty_region(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a per-state event (requires `trace-rich` feature).
    #[inline]
    pub fn state(&mut self, cell: u32, kind: StateKind) {
        #[cfg(feature = "trace-rich")]
        if let Some(s) = &mut self.sink {
            s.on_state(&StateEvent {
                cell,
                kind: kind.into(),
            });
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = (cell, kind);
        }
    }
}

/// Per-state event kind accepted by [`Tracer::state`] in every build.
///
/// Without `trace-rich` the call compiles away, so the view can report state
/// events unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// A state's `invalid` flag was raised.
    Invalidated,
    /// A state was (re)derived.
    Derived,
    /// A state was dropped.
    Purged,
}

#[cfg(feature = "trace-rich")]
impl From<StateKind> for StateEventKind {
    fn from(kind: StateKind) -> Self {
        match kind {
            StateKind::Invalidated => Self::Invalidated,
            StateKind::Derived => Self::Derived,
            StateKind::Purged => Self::Purged,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        transactions: u32,
        dirty: Vec<Option<Rect>>,
    }

    impl TraceSink for Counting {
        fn on_transaction(&mut self, _: &TransactionEvent) {
            self.transactions += 1;
        }

        fn on_dirty_region(&mut self, e: &DirtyRegionEvent) {
            self.dirty.push(e.dirty);
        }
    }

    #[test]
    fn noop_sink_accepts_every_event() {
        let mut sink = NoopSink;
        let mut tracer = Tracer::new(&mut sink);
        tracer.transaction(&TransactionEvent {
            sequence: 1,
            change_count: 3,
        });
        tracer.overflow(&OverflowEvent {
            sequence: 1,
            change_count: 3,
            threshold: 2,
        });
        tracer.validate(&ValidateEvent {
            sequence: 1,
            derived: 0,
            states: 0,
        });
        tracer.state(0, StateKind::Derived);
    }

    #[test]
    fn none_tracer_discards() {
        let mut tracer = Tracer::none();
        tracer.dirty_region(&DirtyRegionEvent {
            sequence: 1,
            dirty: None,
            overflowed: false,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_shared_sink() {
        let shared = Rc::new(RefCell::new(Counting::default()));
        let mut handle = Rc::clone(&shared);
        {
            let mut tracer = Tracer::new(&mut handle);
            tracer.transaction(&TransactionEvent {
                sequence: 4,
                change_count: 1,
            });
            tracer.dirty_region(&DirtyRegionEvent {
                sequence: 4,
                dirty: Some(Rect::new(0.0, 0.0, 1.0, 1.0)),
                overflowed: false,
            });
        }
        let sink = shared.borrow();
        assert_eq!(sink.transactions, 1);
        assert_eq!(sink.dirty, vec![Some(Rect::new(0.0, 0.0, 1.0, 1.0))]);
    }

    #[cfg(not(feature = "trace"))]
    #[test]
    fn tracer_is_inert_without_feature() {
        let mut sink = Counting::default();
        {
            let mut tracer = Tracer::new(&mut sink);
            tracer.transaction(&TransactionEvent {
                sequence: 1,
                change_count: 1,
            });
        }
        assert_eq!(sink.transactions, 0);
        assert!(sink.dirty.is_empty());
    }
}
