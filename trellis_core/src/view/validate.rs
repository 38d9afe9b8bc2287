// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State derivation.
//!
//! Validation runs in two walks over the model tree:
//!
//! 1. [`validate_cell`](GraphView::validate_cell) creates a state for every
//!    visible cell and purges the states of hidden ones. Children of a
//!    collapsed cell count as hidden.
//! 2. [`validate_cell_state`](GraphView::validate_cell_state) re-derives each
//!    invalid state after its parent and, for edges, after the states of its
//!    visible terminals. The `invalid` flag is cleared before recursing, so
//!    terminal cycles between edges terminate.
//!
//! A cycle means some state is derived while one of its inputs is still in
//! progress (two edges connected to each other, or a label child that is also
//! its edge's terminal). Such a state is queued and derived once more after
//! the walk, from finished inputs, and so is every state that read it.
//!
//! Deriving a state also records its dependency edges on the
//! [`GEOMETRY`](crate::dirty::GEOMETRY) channel, which later invalidation
//! follows. Edges the tracker rejects as cycles are kept on the side and
//! followed by hand.

use kurbo::{Affine, Point, Rect, Size, Vec2};

use super::GraphView;
use super::perimeter::Perimeter;
use super::state::CellState;
use crate::constants::{
    DEFAULT_SHADOW_OFFSET_X, DEFAULT_SHADOW_OFFSET_Y, DEFAULT_START_SIZE, DEFAULT_STROKE_WIDTH,
    ENTRY_X, ENTRY_Y, EXIT_X, EXIT_Y, HORIZONTAL, LABEL_HEIGHT, LABEL_POSITION, LABEL_WIDTH,
    PERIMETER, PERIMETER_SPACING, ROTATION, SHADOW, SHADOW_OFFSET_X, SHADOW_OFFSET_Y, SHAPE,
    SHAPE_SWIMLANE, SPACING, START_SIZE, STROKE_WIDTH, VERTICAL_LABEL_POSITION,
};
use crate::dirty;
use crate::geometry::Geometry;
use crate::model::{CellId, GraphModel, INVALID};
use crate::style::{Style, Stylesheet};
use crate::trace::{StateKind, Tracer};

impl GraphView {
    /// Brings the states of `cell` (or the whole model when `None`) and its
    /// visible descendants up to date.
    ///
    /// Valid states are skipped, so validating twice in a row derives
    /// nothing the second time.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not a live handle of `model`.
    pub fn validate(&mut self, model: &GraphModel, stylesheet: &Stylesheet, cell: Option<CellId>) {
        self.validate_traced(model, stylesheet, cell, &mut Tracer::none());
    }

    pub(crate) fn validate_traced(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        cell: Option<CellId>,
        tracer: &mut Tracer<'_>,
    ) {
        let start = match cell {
            Some(c) => {
                model.validate(c);
                c.idx
            }
            None => model.root().idx,
        };
        self.reserve_slots(model);
        let visible = self.prepare_ancestors(model, start);
        self.validate_cell(model, start, visible, tracer);
        self.validate_cell_state(model, stylesheet, start, true, tracer);
        self.settle_deferred(model, stylesheet, tracer);
        self.graph_bounds = self
            .states()
            .filter_map(CellState::bounding_box)
            .reduce(|a, b| a.union(b));
    }

    pub(crate) fn reserve_slots(&mut self, model: &GraphModel) {
        let len = model.slot_count() as usize;
        if self.states.len() < len {
            self.states.resize_with(len, || None);
        }
    }

    /// Returns whether `start` is visible given its ancestors, and makes
    /// sure every ancestor has a state to derive from.
    fn prepare_ancestors(&mut self, model: &GraphModel, start: u32) -> bool {
        let root = model.root().idx;
        if start == root {
            return true;
        }
        if !model.slot_is_ancestor(root, start) {
            return false;
        }
        let mut chain = Vec::new();
        let mut visible = true;
        let mut p = model.parent[start as usize];
        while p != INVALID {
            visible &= model.visible[p as usize];
            if p != root {
                visible &= !model.collapsed[p as usize];
            }
            chain.push(p);
            p = model.parent[p as usize];
        }
        if visible {
            for idx in chain {
                self.ensure_state(model, idx);
            }
        }
        visible
    }

    fn ensure_state(&mut self, model: &GraphModel, idx: u32) {
        let handle = model.handle(idx);
        let stale = self.states[idx as usize]
            .as_ref()
            .is_none_or(|s| s.cell != handle);
        if stale {
            if self.states[idx as usize].is_some() {
                self.dirty.remove_key(idx);
                self.forget_cyclic(idx);
            }
            self.states[idx as usize] = Some(CellState::new(handle, model.kind[idx as usize]));
        }
    }

    /// Creates states for visible cells and purges hidden ones.
    pub(crate) fn validate_cell(
        &mut self,
        model: &GraphModel,
        idx: u32,
        visible: bool,
        tracer: &mut Tracer<'_>,
    ) {
        let visible = visible && model.visible[idx as usize];
        if !visible {
            self.purge_subtree(model, idx, tracer);
            return;
        }
        self.ensure_state(model, idx);
        let show_children = idx == model.root().idx || !model.collapsed[idx as usize];
        for &child in &model.children[idx as usize] {
            self.validate_cell(model, child, show_children, tracer);
        }
    }

    /// Drops the states of `idx` and its descendants.
    pub(crate) fn purge_subtree(&mut self, model: &GraphModel, idx: u32, tracer: &mut Tracer<'_>) {
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            if let Some(slot) = self.states.get_mut(i as usize) {
                if slot.take().is_some() {
                    self.dirty.remove_key(i);
                    self.forget_cyclic(i);
                    tracer.state(i, StateKind::Purged);
                }
            }
            stack.extend(&model.children[i as usize]);
        }
    }

    /// Re-derives `idx` if invalid, then optionally its descendants.
    pub(crate) fn validate_cell_state(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        idx: u32,
        recurse: bool,
        tracer: &mut Tracer<'_>,
    ) {
        let Some(state) = self.state_at_mut(idx) else {
            return;
        };
        if state.invalid {
            state.invalid = false;
            self.resolving.push(idx);
            let parent = model.parent[idx as usize];
            if parent != INVALID {
                self.validate_cell_state(model, stylesheet, parent, false, tracer);
            }
            let (source, target) = if model.kind[idx as usize].is_edge() {
                (
                    self.visible_terminal(model, idx, true),
                    self.visible_terminal(model, idx, false),
                )
            } else {
                (None, None)
            };
            for t in [source, target].into_iter().flatten() {
                self.validate_cell_state(model, stylesheet, t, false, tracer);
            }
            self.update_cell_state(model, stylesheet, idx, source, target, tracer);
            self.resolving.pop();
        }
        if recurse {
            for &child in &model.children[idx as usize] {
                self.validate_cell_state(model, stylesheet, child, true, tracer);
            }
        }
    }

    /// Finds the cell that stands in for an edge's terminal: the terminal
    /// itself, or its outermost hidden or collapsed ancestor below a layer.
    ///
    /// Returns `None` for a missing terminal, a terminal outside the current
    /// root, a layer, the edge itself, or a stand-in without a state.
    pub(crate) fn visible_terminal(&self, model: &GraphModel, edge: u32, is_source: bool) -> Option<u32> {
        let root = model.root().idx;
        let mut terminal = if is_source {
            model.source[edge as usize]
        } else {
            model.target[edge as usize]
        };
        let mut best = terminal;
        while terminal != INVALID && terminal != root {
            if !model.visible[best as usize] || model.collapsed[terminal as usize] {
                best = terminal;
            }
            terminal = model.parent[terminal as usize];
        }
        if best == INVALID
            || best == edge
            || model.parent[best as usize] == root
            || !model.slot_is_ancestor(root, best)
        {
            return None;
        }
        self.state_at(best).map(|_| best)
    }

    fn update_cell_state(
        &mut self,
        model: &GraphModel,
        stylesheet: &Stylesheet,
        idx: u32,
        source: Option<u32>,
        target: Option<u32>,
        tracer: &mut Tracer<'_>,
    ) {
        let Some(mut state) = self.states[idx as usize].take() else {
            return;
        };
        self.derivations += 1;
        tracer.state(idx, StateKind::Derived);

        let i = idx as usize;
        let kind = model.kind[i];
        let parent = model.parent[i];
        state.kind = kind;
        state.style = stylesheet.resolve(&model.style[i], kind.is_edge());
        state.visible_source = source.map(|s| model.handle(s));
        state.visible_target = target.map(|t| model.handle(t));

        // Rewire dependency edges.
        for &old in &state.deps {
            self.dirty.remove_dependency(idx, old, dirty::GEOMETRY);
        }
        state.deps.clear();
        self.cyclic.retain(|&(from, _)| from != idx);
        for dep in [Some(parent), source, target].into_iter().flatten() {
            if dep == INVALID || dep == idx || self.state_at(dep).is_none() {
                continue;
            }
            if self.resolving.contains(&dep) && !self.deferred.contains(&idx) {
                self.deferred.push(idx);
            }
            if state.deps.contains(&dep) || self.cyclic.contains(&(idx, dep)) {
                continue;
            }
            if self.dirty.add_dependency(idx, dep, dirty::GEOMETRY).is_ok() {
                state.deps.push(dep);
            } else {
                self.cyclic.push((idx, dep));
            }
        }

        let root = model.root().idx;
        let parent_state = if parent == INVALID {
            None
        } else {
            self.state_at(parent)
        };
        state.origin = parent_state.map_or(Point::ZERO, CellState::origin);
        state.absolute_offset = Vec2::ZERO;
        state.points.clear();
        state.length = 0.0;
        state.label_bounds = None;
        state.bounding_box = None;

        match model.geometry[i].as_ref() {
            Some(geo) if idx != root && parent != root => {
                if let Some(p) = parent_state {
                    state.origin += content_offset(p);
                }
                if kind.is_edge() {
                    self.update_edge_state(&mut state, geo, source, target);
                } else {
                    self.update_vertex_state(&mut state, geo, parent_state);
                }
                state.bounding_box = Some(self.bounding_box(&state));
            }
            _ => {
                state.bounds = Rect::from_origin_size(self.to_view(state.origin), Size::ZERO);
            }
        }

        self.states[i] = Some(state);
    }

    /// Re-derives states that read an in-progress state during the walk,
    /// then the states that read those.
    fn settle_deferred(&mut self, model: &GraphModel, stylesheet: &Stylesheet, tracer: &mut Tracer<'_>) {
        let deferred = core::mem::take(&mut self.deferred);
        let mut readers = Vec::new();
        for &idx in &deferred {
            self.rederive(model, stylesheet, idx, tracer);
            for &(from, to) in &self.cyclic {
                if to == idx && !deferred.contains(&from) && !readers.contains(&from) {
                    readers.push(from);
                }
            }
        }
        for idx in readers {
            self.rederive(model, stylesheet, idx, tracer);
        }
        // Nothing is in progress any more, so nothing new was queued.
        self.deferred.clear();
    }

    fn rederive(&mut self, model: &GraphModel, stylesheet: &Stylesheet, idx: u32, tracer: &mut Tracer<'_>) {
        if self.state_at(idx).is_none() {
            return;
        }
        let (source, target) = if model.kind[idx as usize].is_edge() {
            (
                self.visible_terminal(model, idx, true),
                self.visible_terminal(model, idx, false),
            )
        } else {
            (None, None)
        };
        self.update_cell_state(model, stylesheet, idx, source, target, tracer);
    }

    /// Drops the cycle pairs that name `idx`.
    pub(crate) fn forget_cyclic(&mut self, idx: u32) {
        self.cyclic.retain(|&(from, to)| from != idx && to != idx);
    }

    fn update_vertex_state(&self, state: &mut CellState, geo: &Geometry, parent: Option<&CellState>) {
        let offset = geo.offset.unwrap_or(Vec2::ZERO);
        if geo.relative {
            if let Some(p) = parent {
                if p.kind.is_edge() {
                    let along = p
                        .point_along((geo.x + 1.0) / 2.0, geo.y * self.scale)
                        .unwrap_or_else(|| p.center());
                    state.origin = self.to_model(along);
                } else {
                    state.origin += Vec2::new(
                        geo.x * p.bounds.width() / self.scale,
                        geo.y * p.bounds.height() / self.scale,
                    );
                }
            }
            state.origin += offset;
        } else {
            state.absolute_offset = offset * self.scale;
            state.origin += Vec2::new(geo.x, geo.y);
        }
        state.bounds = Rect::from_origin_size(
            self.to_view(state.origin),
            Size::new(geo.width.max(0.0) * self.scale, geo.height.max(0.0) * self.scale),
        );
        state.label_bounds = Some(self.vertex_label(state));
    }

    fn update_edge_state(
        &self,
        state: &mut CellState,
        geo: &Geometry,
        source: Option<u32>,
        target: Option<u32>,
    ) {
        let origin = state.origin.to_vec2();
        let src = source.and_then(|s| self.state_at(s));
        let tgt = target.and_then(|t| self.state_at(t));

        let fixed_source = match src {
            Some(s) => fixed_point(s, &state.style, true),
            None => geo.source_point.map(|p| self.to_view(p + origin)),
        };
        let fixed_target = match tgt {
            Some(t) => fixed_point(t, &state.style, false),
            None => geo.target_point.map(|p| self.to_view(p + origin)),
        };
        let waypoints: Vec<Point> = geo.points.iter().map(|&p| self.to_view(p + origin)).collect();

        // The source end aims at the first waypoint or the target; the target
        // end then aims at the last waypoint or the resolved source end.
        let source_end = fixed_source.or_else(|| {
            src.map(|s| {
                let next = waypoints
                    .first()
                    .copied()
                    .or(fixed_target)
                    .or_else(|| tgt.map(CellState::center))
                    .unwrap_or_else(|| s.center());
                self.floating_point(s, next)
            })
        });
        let target_end = fixed_target.or_else(|| {
            tgt.map(|t| {
                let next = waypoints
                    .last()
                    .copied()
                    .or(source_end)
                    .unwrap_or_else(|| t.center());
                self.floating_point(t, next)
            })
        });

        state.points = source_end
            .into_iter()
            .chain(waypoints)
            .chain(target_end)
            .collect();
        state.length = state.points.windows(2).map(|p| p[0].distance(p[1])).sum();
        state.bounds = match state.points.split_first() {
            Some((&first, rest)) => rest
                .iter()
                .fold(Rect::from_origin_size(first, Size::ZERO), |r, &p| r.union_pt(p)),
            None => Rect::from_origin_size(self.to_view(state.origin), Size::ZERO),
        };

        state.label_bounds = state
            .point_along((geo.x + 1.0) / 2.0, geo.y * self.scale)
            .map(|anchor| {
                let anchor = anchor + geo.offset.unwrap_or(Vec2::ZERO) * self.scale;
                let size = Size::new(
                    state.style.get_number(LABEL_WIDTH, 0.0).max(0.0) * self.scale,
                    state.style.get_number(LABEL_HEIGHT, 0.0).max(0.0) * self.scale,
                );
                Rect::from_center_size(anchor, size)
            });
    }

    /// Projects a floating edge end onto a terminal's perimeter.
    fn floating_point(&self, terminal: &CellState, next: Point) -> Point {
        if terminal.kind.is_edge() {
            return terminal.center();
        }
        let spacing = terminal.style.get_number(PERIMETER_SPACING, 0.0) * self.scale;
        let bounds = terminal.bounds.inflate(spacing, spacing);
        Perimeter::from_style(terminal.style.get_str(PERIMETER)).project(bounds, next)
    }

    fn vertex_label(&self, state: &CellState) -> Rect {
        let b = state.bounds;
        let mut label = b;
        match state.style.get_str(LABEL_POSITION) {
            Some("left") => label = label - Vec2::new(b.width(), 0.0),
            Some("right") => label = label + Vec2::new(b.width(), 0.0),
            _ => {}
        }
        match state.style.get_str(VERTICAL_LABEL_POSITION) {
            Some("top") => label = label - Vec2::new(0.0, b.height()),
            Some("bottom") => label = label + Vec2::new(0.0, b.height()),
            _ => {}
        }
        label = label + state.absolute_offset;
        let spacing = state.style.get_number(SPACING, 0.0) * self.scale;
        let sx = spacing.min(label.width() / 2.0);
        let sy = spacing.min(label.height() / 2.0);
        Rect::new(label.x0 + sx, label.y0 + sy, label.x1 - sx, label.y1 - sy)
    }

    /// Bounds and label, grown by rotation, stroke, and shadow.
    fn bounding_box(&self, state: &CellState) -> Rect {
        let style = &state.style;
        let mut bbox = match state.label_bounds {
            Some(label) => state.bounds.union(label),
            None => state.bounds,
        };
        let rotation = style.get_number(ROTATION, 0.0);
        if rotation != 0.0 && !state.kind.is_edge() {
            bbox = Affine::rotate_about(rotation.to_radians(), state.bounds.center())
                .transform_rect_bbox(bbox);
        }
        let half_stroke = style.get_number(STROKE_WIDTH, DEFAULT_STROKE_WIDTH).max(0.0) * self.scale / 2.0;
        bbox = bbox.inflate(half_stroke, half_stroke);
        if style.get_bool(SHADOW, false) {
            let shadow = Vec2::new(
                style.get_number(SHADOW_OFFSET_X, DEFAULT_SHADOW_OFFSET_X),
                style.get_number(SHADOW_OFFSET_Y, DEFAULT_SHADOW_OFFSET_Y),
            ) * self.scale;
            bbox = bbox.union(bbox + shadow);
        }
        bbox
    }

    /// Maps an unscaled model point to view coordinates.
    pub(crate) fn to_view(&self, p: Point) -> Point {
        Point::new(
            self.scale * (self.translate.x + p.x),
            self.scale * (self.translate.y + p.y),
        )
    }

    /// Maps a view point back to unscaled model coordinates.
    pub(crate) fn to_model(&self, p: Point) -> Point {
        Point::new(
            p.x / self.scale - self.translate.x,
            p.y / self.scale - self.translate.y,
        )
    }
}

/// Offset a container applies to its children's frame (a swimlane's title
/// bar).
fn content_offset(parent: &CellState) -> Vec2 {
    if parent.style.get_str(SHAPE) != Some(SHAPE_SWIMLANE) {
        return Vec2::ZERO;
    }
    let size = parent.style.get_number(START_SIZE, DEFAULT_START_SIZE).max(0.0);
    if parent.style.get_bool(HORIZONTAL, true) {
        Vec2::new(0.0, size)
    } else {
        Vec2::new(size, 0.0)
    }
}

/// Connection point fixed by `exitX/exitY` (source) or `entryX/entryY`
/// (target) on the edge style.
fn fixed_point(terminal: &CellState, edge_style: &Style, is_source: bool) -> Option<Point> {
    if terminal.kind.is_edge() {
        return None;
    }
    let (kx, ky) = if is_source {
        (EXIT_X, EXIT_Y)
    } else {
        (ENTRY_X, ENTRY_Y)
    };
    let fx = edge_style.number(kx)?;
    let fy = edge_style.number(ky)?;
    let b = terminal.bounds;
    Some(Point::new(b.x0 + fx * b.width(), b.y0 + fy * b.height()))
}
