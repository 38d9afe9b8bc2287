// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Graph`] facade: model, view, stylesheet, and change listeners.
//!
//! `Graph` is the entry point for collaborators that edit a diagram. It
//! wraps the model's transactions so that every outermost
//! [`end_update`](Graph::end_update) feeds the change log to the view and
//! then notifies listeners, in registration order, with one
//! [`GraphChanged`] event carrying the dirty region.
//!
//! ```
//! use trellis_core::geometry::Geometry;
//! use trellis_core::graph::{Graph, GraphChanged};
//!
//! let mut graph = Graph::new();
//! let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! graph.add_listener(Box::new(move |e: &GraphChanged| sink.borrow_mut().push(e.dirty)));
//!
//! let v = graph.insert_vertex(None, Geometry::new(20.0, 20.0, 80.0, 30.0), "");
//! assert!(graph.state(v).is_some());
//! assert_eq!(seen.borrow().len(), 1);
//! ```
//!
//! Listeners only receive the event, never the graph, so they cannot
//! mutate the model while a change log is being consumed.

use core::ops::{Deref, DerefMut};

use kurbo::{Rect, Vec2};
use tracing::debug;

use crate::change::UndoableEdit;
use crate::config::ViewConfig;
use crate::geometry::Geometry;
use crate::model::{CellId, GraphModel};
use crate::style::Stylesheet;
use crate::trace::{TraceSink, Tracer};
use crate::view::{CellState, GraphView, ViewUpdate};

/// Emitted once per outermost transaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphChanged {
    /// Sequence number of the edit.
    pub sequence: u64,
    /// Region to repaint. `None` means nothing to repaint.
    pub dirty: Option<Rect>,
    /// Number of change records in the edit.
    pub change_count: usize,
    /// Whether the threshold valve replaced per-record tracking.
    pub overflowed: bool,
}

/// Receives [`GraphChanged`] events.
pub trait GraphListener {
    /// Called after the view has consumed a transaction.
    fn graph_changed(&mut self, event: &GraphChanged);
}

impl<F: FnMut(&GraphChanged)> GraphListener for F {
    fn graph_changed(&mut self, event: &GraphChanged) {
        self(event);
    }
}

/// A diagram: model, view, and stylesheet kept in sync.
pub struct Graph {
    model: GraphModel,
    view: GraphView,
    stylesheet: Stylesheet,
    listeners: Vec<Box<dyn GraphListener>>,
    trace_sink: Option<Box<dyn TraceSink>>,
    last_edit: Option<UndoableEdit>,
}

impl core::fmt::Debug for Graph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Graph")
            .field("model", &self.model)
            .field("view", &self.view)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates an empty graph with the default configuration and stylesheet.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ViewConfig::default(), Stylesheet::new())
    }

    /// Creates an empty graph.
    #[must_use]
    pub fn with_config(config: ViewConfig, stylesheet: Stylesheet) -> Self {
        Self {
            model: GraphModel::new(),
            view: GraphView::new(config),
            stylesheet,
            listeners: Vec::new(),
            trace_sink: None,
            last_edit: None,
        }
    }

    /// Returns the model.
    #[must_use]
    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// Returns the view.
    #[must_use]
    pub fn view(&self) -> &GraphView {
        &self.view
    }

    /// Returns the stylesheet.
    #[must_use]
    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Returns the cached state of a cell.
    #[must_use]
    pub fn state(&self, cell: CellId) -> Option<&CellState> {
        self.view.state(cell)
    }

    /// Registers a listener. Listeners are called in registration order.
    pub fn add_listener(&mut self, listener: Box<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    /// Routes view trace events to `sink` (effective with the `trace`
    /// feature).
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace_sink = Some(sink);
    }

    /// Removes the trace sink.
    pub fn clear_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace_sink.take()
    }

    // -- Transactions --

    /// Opens (or nests) a transaction.
    pub fn begin_update(&mut self) {
        self.model.begin_update();
    }

    /// Closes a transaction. The outermost close updates the view, notifies
    /// listeners, and returns the edit.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is open.
    pub fn end_update(&mut self) -> Option<UndoableEdit> {
        let edit = self.model.end_update()?;
        let update = self.consume(&edit);
        let event = GraphChanged {
            sequence: edit.sequence,
            dirty: update.dirty,
            change_count: edit.len(),
            overflowed: update.overflowed,
        };
        debug!(
            sequence = event.sequence,
            changes = event.change_count,
            dirty = ?event.dirty,
            overflowed = event.overflowed,
            "graph changed"
        );
        for listener in &mut self.listeners {
            listener.graph_changed(&event);
        }
        Some(edit)
    }

    /// Opens a transaction that closes when the returned guard drops.
    ///
    /// The guard dereferences to the model. The edit of the outermost guard
    /// is available from [`take_last_edit`](Self::take_last_edit).
    pub fn update(&mut self) -> UpdateGuard<'_> {
        self.begin_update();
        UpdateGuard { graph: self }
    }

    /// Takes the edit recorded by the last outermost [`UpdateGuard`].
    pub fn take_last_edit(&mut self) -> Option<UndoableEdit> {
        self.last_edit.take()
    }

    fn consume(&mut self, edit: &UndoableEdit) -> ViewUpdate {
        match self.trace_sink.as_deref_mut() {
            Some(sink) => {
                let mut tracer = Tracer::new(sink);
                self.view
                    .model_changed_traced(&self.model, &self.stylesheet, edit, &mut tracer)
            }
            None => self.view.model_changed(&self.model, &self.stylesheet, edit),
        }
    }

    // -- Editing --

    /// Inserts a new vertex under `parent` (the default layer if `None`).
    pub fn insert_vertex(&mut self, parent: Option<CellId>, geometry: Geometry, style: &str) -> CellId {
        let cell = self.model.create_vertex(geometry, style);
        self.insert(parent, cell);
        cell
    }

    /// Inserts a new group under `parent` (the default layer if `None`).
    pub fn insert_group(&mut self, parent: Option<CellId>, geometry: Geometry, style: &str) -> CellId {
        let cell = self.model.create_group(geometry, style);
        self.insert(parent, cell);
        cell
    }

    /// Inserts a new edge under `parent` (the default layer if `None`).
    pub fn insert_edge(
        &mut self,
        parent: Option<CellId>,
        source: Option<CellId>,
        target: Option<CellId>,
        style: &str,
    ) -> CellId {
        let cell = self.model.create_edge(source, target, style);
        self.insert(parent, cell);
        cell
    }

    fn insert(&mut self, parent: Option<CellId>, cell: CellId) {
        let parent = parent.unwrap_or_else(|| self.model.default_parent());
        self.begin_update();
        self.model.add_child(parent, cell);
        self.end_update();
    }

    /// Detaches a cell. Returns `false` if it had no parent.
    pub fn remove_cell(&mut self, cell: CellId) -> bool {
        self.begin_update();
        let removed = self.model.remove(cell);
        self.end_update();
        removed
    }

    /// Moves a cell by `(dx, dy)` in its parent's frame.
    pub fn translate_cell(&mut self, cell: CellId, dx: f64, dy: f64) {
        let Some(geometry) = self.model.geometry(cell).map(|g| g.translated(dx, dy)) else {
            return;
        };
        self.begin_update();
        self.model.set_geometry(cell, geometry);
        self.end_update();
    }

    /// Collapses or expands a cell, swapping in its alternate bounds if it
    /// has any. Does nothing if the cell is already in that state.
    pub fn fold(&mut self, cell: CellId, collapse: bool) {
        if self.model.is_collapsed(cell) == collapse {
            return;
        }
        let swapped = self
            .model
            .geometry(cell)
            .filter(|g| g.alternate_bounds.is_some())
            .map(Geometry::swapped_alternate_bounds);
        self.begin_update();
        self.model.set_collapsed(cell, collapse);
        if let Some(geometry) = swapped {
            self.model.set_geometry(cell, geometry);
        }
        self.end_update();
    }

    /// Reverts an edit in a new transaction and returns that transaction's
    /// edit.
    pub fn undo(&mut self, edit: &UndoableEdit) -> Option<UndoableEdit> {
        self.begin_update();
        self.model.undo(edit);
        self.end_update()
    }

    /// Re-applies an edit in a new transaction and returns that
    /// transaction's edit.
    pub fn redo(&mut self, edit: &UndoableEdit) -> Option<UndoableEdit> {
        self.begin_update();
        self.model.redo(edit);
        self.end_update()
    }

    // -- View --

    /// Validates `cell` (or everything) without a transaction.
    pub fn validate(&mut self, cell: Option<CellId>) {
        self.view.validate(&self.model, &self.stylesheet, cell);
    }

    /// Replaces the stylesheet and rederives every state. Returns the dirty
    /// region.
    pub fn set_stylesheet(&mut self, stylesheet: Stylesheet) -> Option<Rect> {
        self.stylesheet = stylesheet;
        self.view.refresh(&self.model, &self.stylesheet)
    }

    /// Sets the view scale. Returns the dirty region.
    pub fn set_scale(&mut self, scale: f64) -> Option<Rect> {
        self.view.set_scale(&self.model, &self.stylesheet, scale)
    }

    /// Sets the view translation. Returns the dirty region.
    pub fn set_translate(&mut self, translate: Vec2) -> Option<Rect> {
        self.view.set_translate(&self.model, &self.stylesheet, translate)
    }
}

/// Scoped transaction returned by [`Graph::update`].
///
/// Dereferences to the [`GraphModel`] for mutation and closes the
/// transaction on drop, including during unwinding. If a panic unwinds
/// through the outermost guard, the view cache is dropped instead of
/// updated and listeners are not called; the next validation rebuilds it.
pub struct UpdateGuard<'a> {
    graph: &'a mut Graph,
}

impl core::fmt::Debug for UpdateGuard<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpdateGuard").finish_non_exhaustive()
    }
}

impl Deref for UpdateGuard<'_> {
    type Target = GraphModel;

    fn deref(&self) -> &GraphModel {
        &self.graph.model
    }
}

impl DerefMut for UpdateGuard<'_> {
    fn deref_mut(&mut self) -> &mut GraphModel {
        &mut self.graph.model
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if self.graph.model.end_update().is_some() {
                self.graph.view.clear();
            }
            return;
        }
        if let Some(edit) = self.graph.end_update() {
            self.graph.last_edit = Some(edit);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recording(graph: &mut Graph) -> Rc<RefCell<Vec<GraphChanged>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        graph.add_listener(Box::new(move |e: &GraphChanged| sink.borrow_mut().push(*e)));
        events
    }

    #[test]
    fn one_event_per_outermost_transaction() {
        let mut graph = Graph::new();
        let events = recording(&mut graph);
        graph.begin_update();
        let a = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "");
        let b = graph.insert_vertex(None, Geometry::new(20.0, 0.0, 10.0, 10.0), "");
        assert!(events.borrow().is_empty(), "nested inserts must not notify");
        let edit = graph.end_update().unwrap();

        assert_eq!(edit.len(), 2);
        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change_count, 2);
        assert_eq!(events[0].sequence, edit.sequence);
        let expected = graph
            .state(a)
            .unwrap()
            .bounding_box()
            .unwrap()
            .union(graph.state(b).unwrap().bounding_box().unwrap());
        assert_eq!(events[0].dirty, Some(expected));
    }

    #[test]
    fn empty_transaction_reports_nothing_to_repaint() {
        let mut graph = Graph::new();
        let events = recording(&mut graph);
        graph.begin_update();
        let edit = graph.end_update().unwrap();
        assert!(edit.is_empty());
        assert_eq!(events.borrow()[0].dirty, None);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let mut graph = Graph::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Rc::clone(&order);
            graph.add_listener(Box::new(move |_: &GraphChanged| order.borrow_mut().push(tag)));
        }
        graph.insert_vertex(None, Geometry::new(0.0, 0.0, 1.0, 1.0), "");
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn guard_closes_transaction_on_drop() {
        let mut graph = Graph::new();
        let events = recording(&mut graph);
        let layer = graph.model().default_parent();
        let v = {
            let mut tx = graph.update();
            let v = tx.create_vertex(Geometry::new(5.0, 5.0, 10.0, 10.0), "");
            tx.add_child(layer, v);
            v
        };
        assert_eq!(graph.model().update_level(), 0);
        assert_eq!(events.borrow().len(), 1);
        assert!(graph.state(v).is_some());
        assert_eq!(graph.take_last_edit().map(|e| e.len()), Some(1));
    }

    #[test]
    fn guard_unwinds_to_a_consistent_model() {
        let mut graph = Graph::new();
        let v = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut tx = graph.update();
            tx.set_value(v, Some("partial".into()));
            panic!("collaborator failure");
        }));
        assert!(result.is_err());
        assert_eq!(graph.model().update_level(), 0);
        // The applied mutation stands; no rollback.
        assert_eq!(graph.model().value(v), Some("partial"));
        graph.validate(None);
        assert!(graph.state(v).is_some());
    }

    #[test]
    fn translate_and_undo_report_both_footprints() {
        let mut graph = Graph::new();
        let v = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "");
        let before = graph.state(v).unwrap().bounding_box().unwrap();
        graph.begin_update();
        graph.translate_cell(v, 100.0, 0.0);
        let edit = graph.end_update().unwrap();
        let after = graph.state(v).unwrap().bounding_box().unwrap();
        assert_eq!(after, before + Vec2::new(100.0, 0.0));

        let events = recording(&mut graph);
        graph.undo(&edit);
        assert_eq!(graph.state(v).unwrap().bounding_box(), Some(before));
        assert_eq!(events.borrow()[0].dirty, Some(before.union(after)));

        graph.redo(&edit);
        assert_eq!(graph.state(v).unwrap().bounding_box(), Some(after));
    }

    #[test]
    fn fold_swaps_alternate_bounds() {
        let mut graph = Graph::new();
        let group = graph.insert_group(
            None,
            Geometry::new(10.0, 10.0, 200.0, 100.0)
                .with_alternate_bounds(Rect::new(0.0, 0.0, 60.0, 20.0)),
            "",
        );
        let child = graph.insert_vertex(Some(group), Geometry::new(20.0, 20.0, 30.0, 30.0), "");
        let events = recording(&mut graph);
        let expanded = graph.state(group).unwrap().bounding_box();

        graph.fold(group, true);
        assert!(graph.state(child).is_none());
        assert_eq!(
            graph.state(group).unwrap().bounds(),
            Rect::new(10.0, 10.0, 70.0, 30.0)
        );
        assert_eq!(events.borrow()[0].dirty, expanded);
        assert_eq!(events.borrow()[0].change_count, 2);

        graph.fold(group, true);
        assert_eq!(events.borrow().len(), 1, "folding twice is a no-op");

        graph.fold(group, false);
        assert!(graph.state(child).is_some());
        assert_eq!(
            graph.state(group).unwrap().bounds(),
            Rect::new(10.0, 10.0, 210.0, 110.0)
        );
    }

    #[test]
    fn stylesheet_replacement_rederives_states() {
        let mut graph = Graph::new();
        let v = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "thick");
        let thin = graph.state(v).unwrap().bounding_box().unwrap();
        let mut sheet = Stylesheet::new();
        sheet.put_style(
            "thick",
            crate::style::Style::new().with("strokeWidth", crate::style::StyleValue::Number(5.0)),
        );
        let dirty = graph.set_stylesheet(sheet).unwrap();
        let thick = graph.state(v).unwrap().bounding_box().unwrap();
        assert_eq!(thick, Rect::new(-2.5, -2.5, 12.5, 12.5));
        assert_eq!(dirty, thin.union(thick));
    }
}
