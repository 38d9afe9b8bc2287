// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view-state cache.
//!
//! [`GraphView`] owns one [`CellState`] per visible cell and keeps it in sync
//! with a [`GraphModel`] by consuming each closed transaction's change log:
//!
//! 1. **Pass 1** ([`process_changes`](GraphView::process_changes) with
//!    `invalidate = true`) collects the *old* bounding boxes of everything a
//!    record affects, raises `invalid` flags through the dependency graph,
//!    and purges the states of detached subtrees.
//! 2. **Validation** ([`validate`](GraphView::validate)) re-derives invalid
//!    states top-down; valid states are skipped.
//! 3. **Pass 2** (`invalidate = false`) collects the *new* bounding boxes.
//!
//! The union of both passes is the dirty region. Change logs longer than
//! [`ViewConfig::change_threshold`] skip per-record tracking: the cache is
//! rebuilt and the old and new graph bounds are reported instead.

mod changes;
mod perimeter;
mod region;
mod state;
mod validate;

pub use perimeter::Perimeter;
pub use region::{DirtyRegion, union_rects};
pub use state::CellState;

use kurbo::{Rect, Vec2};
use tracing::debug;
use understory_dirty::{CycleHandling, DirtyTracker};

use crate::change::{Change, UndoableEdit};
use crate::config::ViewConfig;
use crate::model::{CellId, GraphModel};
use crate::style::Stylesheet;
use crate::trace::{
    DirtyRegionEvent, OverflowEvent, StateKind, Tracer, TransactionEvent, ValidateEvent,
};

/// Result of consuming one change log.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewUpdate {
    /// Region to repaint, or `None` if nothing changed visually.
    pub dirty: Option<Rect>,
    /// Whether the threshold valve replaced per-record tracking.
    pub overflowed: bool,
}

/// Incremental cache of derived cell geometry.
#[derive(Debug)]
pub struct GraphView {
    pub(crate) states: Vec<Option<CellState>>,
    pub(crate) scale: f64,
    pub(crate) translate: Vec2,
    pub(crate) graph_bounds: Option<Rect>,
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) config: ViewConfig,
    pub(crate) derivations: u64,
    /// Slots invalidated by the latest pass 1 whose new bounds pass 2 must
    /// report. Every pass 1 starts it afresh.
    pub(crate) touched: Vec<u32>,
    /// Slots whose derivation is in progress during a validation walk.
    pub(crate) resolving: Vec<u32>,
    /// Slots derived from an in-progress state, re-derived after the walk.
    pub(crate) deferred: Vec<u32>,
    /// `(dependent, dependency)` pairs the tracker rejected as cycles.
    pub(crate) cyclic: Vec<(u32, u32)>,
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl GraphView {
    /// Creates an empty view.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        let [tx, ty] = config.initial_translate;
        Self {
            states: Vec::new(),
            scale: config.initial_scale,
            translate: Vec2::new(tx, ty),
            graph_bounds: None,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            config,
            derivations: 0,
            touched: Vec::new(),
            resolving: Vec::new(),
            deferred: Vec::new(),
            cyclic: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Returns the global scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the global translation, in unscaled units.
    #[must_use]
    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    /// Returns the state of a cell, if one is cached.
    ///
    /// The state may be invalid between a change and the next validation;
    /// check [`CellState::is_invalid`].
    #[must_use]
    pub fn state(&self, cell: CellId) -> Option<&CellState> {
        self.states
            .get(cell.idx as usize)
            .and_then(Option::as_ref)
            .filter(|s| s.cell == cell)
    }

    /// Returns the state in a slot, regardless of generation.
    pub(crate) fn state_at(&self, idx: u32) -> Option<&CellState> {
        self.states.get(idx as usize).and_then(Option::as_ref)
    }

    pub(crate) fn state_at_mut(&mut self, idx: u32) -> Option<&mut CellState> {
        self.states.get_mut(idx as usize).and_then(Option::as_mut)
    }

    /// Iterates over all cached states in slot order.
    pub fn states(&self) -> impl Iterator<Item = &CellState> {
        self.states.iter().flatten()
    }

    /// Returns the number of cached states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.iter().flatten().count()
    }

    /// Returns the union of all rendered bounding boxes.
    #[must_use]
    pub fn graph_bounds(&self) -> Option<Rect> {
        self.graph_bounds
    }

    /// Returns the number of state derivations performed so far.
    #[must_use]
    pub fn derivation_count(&self) -> u64 {
        self.derivations
    }

    /// Drops every cached state.
    pub fn clear(&mut self) {
        self.clear_traced(&mut Tracer::none());
    }

    pub(crate) fn clear_traced(&mut self, tracer: &mut Tracer<'_>) {
        for (idx, slot) in self.states.iter_mut().enumerate() {
            if slot.take().is_some() {
                tracer.state(idx as u32, StateKind::Purged);
            }
        }
        self.dirty = DirtyTracker::with_cycle_handling(CycleHandling::Error);
        self.touched.clear();
        self.deferred.clear();
        self.cyclic.clear();
        self.graph_bounds = None;
    }

    /// Resets scale and translate to the configured initial values.
    pub(crate) fn reset_transform(&mut self) {
        let [tx, ty] = self.config.initial_translate;
        self.scale = self.config.initial_scale;
        self.translate = Vec2::new(tx, ty);
    }

    /// Sets the global scale and revalidates. Returns the old and new graph
    /// bounds as the dirty region.
    pub fn set_scale(&mut self, model: &GraphModel, stylesheet: &Stylesheet, scale: f64) -> Option<Rect> {
        self.scale_and_translate(model, stylesheet, scale, self.translate)
    }

    /// Sets the global translation and revalidates. Returns the old and new
    /// graph bounds as the dirty region.
    pub fn set_translate(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        translate: Vec2,
    ) -> Option<Rect> {
        self.scale_and_translate(model, stylesheet, self.scale, translate)
    }

    /// Sets scale and translation together and revalidates.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is not positive and finite.
    pub fn scale_and_translate(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        scale: f64,
        translate: Vec2,
    ) -> Option<Rect> {
        assert!(
            scale.is_finite() && scale > 0.0,
            "scale must be positive and finite, got {scale}"
        );
        if scale == self.scale && translate == self.translate {
            return None;
        }
        self.scale = scale;
        self.translate = translate;
        self.refresh(model, stylesheet)
    }

    /// Marks every state invalid and revalidates, for changes the change
    /// log cannot describe (a new stylesheet, a new transform). Returns the
    /// old and new graph bounds as the dirty region.
    pub fn refresh(&mut self, model: &GraphModel, stylesheet: &Stylesheet) -> Option<Rect> {
        let before = self.graph_bounds;
        for state in self.states.iter_mut().flatten() {
            state.invalid = true;
        }
        self.validate(model, stylesheet, None);
        union_rects(before, self.graph_bounds)
    }

    /// Consumes the change log of a closed transaction and returns the
    /// region to repaint. Afterwards every cached state is valid.
    pub fn model_changed(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        edit: &UndoableEdit,
    ) -> ViewUpdate {
        self.model_changed_traced(model, stylesheet, edit, &mut Tracer::none())
    }

    /// Like [`model_changed`](Self::model_changed), reporting to a tracer.
    pub fn model_changed_traced(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        edit: &UndoableEdit,
        tracer: &mut Tracer<'_>,
    ) -> ViewUpdate {
        tracer.transaction(&TransactionEvent {
            sequence: edit.sequence,
            change_count: edit.len(),
        });
        let derived_before = self.derivations;
        let threshold = self.config.change_threshold;

        let update = if edit.len() > threshold {
            debug!(
                sequence = edit.sequence,
                changes = edit.len(),
                threshold,
                "change log over threshold, rebuilding view"
            );
            tracer.overflow(&OverflowEvent {
                sequence: edit.sequence,
                change_count: edit.len(),
                threshold,
            });
            let before = self.graph_bounds;
            let root_changed = edit
                .changes
                .iter()
                .any(|c| matches!(c, Change::Root { .. }));
            if root_changed && self.config.reset_view_on_root_change {
                self.reset_transform();
            }
            self.clear_traced(tracer);
            self.validate_traced(model, stylesheet, None, tracer);
            ViewUpdate {
                dirty: union_rects(before, self.graph_bounds),
                overflowed: true,
            }
        } else {
            let mut region = DirtyRegion::new();
            region.add(self.process_changes_traced(model, &edit.changes, true, tracer));
            self.validate_traced(model, stylesheet, None, tracer);
            region.add(self.process_changes_traced(model, &edit.changes, false, tracer));
            ViewUpdate {
                dirty: region.rect(),
                overflowed: false,
            }
        };

        tracer.validate(&ValidateEvent {
            sequence: edit.sequence,
            derived: self.derivations - derived_before,
            states: self.state_count(),
        });
        tracer.dirty_region(&DirtyRegionEvent {
            sequence: edit.sequence,
            dirty: update.dirty,
            overflowed: update.overflowed,
        });
        update
    }
}
