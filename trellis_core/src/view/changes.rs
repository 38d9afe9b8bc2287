// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-log consumption: dirty contributions and invalidation.
//!
//! Each record contributes the bounding boxes of the cells it names, read
//! from whatever states exist at the time: old states in pass 1, new ones in
//! pass 2. Pass 1 also invalidates, and every state it invalidates adds its
//! old box immediately and its new box in pass 2, so cells reached only
//! through dependencies (children of a moved group, edges of a moved
//! vertex) are covered too.

use kurbo::Rect;
use understory_dirty::EagerPolicy;

use super::GraphView;
use super::region::DirtyRegion;
use crate::change::Change;
use crate::dirty;
use crate::model::{CellId, GraphModel};
use crate::trace::{StateKind, Tracer};

impl GraphView {
    /// Runs one pass over a change log and returns its dirty contribution.
    ///
    /// With `invalidate`, this is pass 1: contributions use the states as
    /// they were, affected states are marked invalid, and detached subtrees
    /// are purged. Without it, this is pass 2, run after
    /// [`validate`](Self::validate): contributions use the new states.
    ///
    /// A root change ends the pass early and contributes the whole graph
    /// bounds; in pass 1 it also drops every state.
    pub fn process_changes(
        &mut self,
        model: &GraphModel,
        changes: &[Change],
        invalidate: bool,
    ) -> Option<Rect> {
        self.process_changes_traced(model, changes, invalidate, &mut Tracer::none())
    }

    pub(crate) fn process_changes_traced(
        &mut self,
        model: &GraphModel,
        changes: &[Change],
        invalidate: bool,
        tracer: &mut Tracer<'_>,
    ) -> Option<Rect> {
        self.reserve_slots(model);
        if invalidate {
            self.touched.clear();
        }
        let mut region = DirtyRegion::new();
        for change in changes {
            match change {
                Change::Root { .. } => {
                    region.add(self.graph_bounds);
                    if invalidate {
                        if self.config.reset_view_on_root_change {
                            self.reset_transform();
                        }
                        self.clear_traced(tracer);
                    } else {
                        self.touched.clear();
                    }
                    return region.rect();
                }
                Change::Child {
                    child,
                    parent,
                    previous_parent,
                    ..
                } => {
                    // Both parents plus the moved subtree itself, not just
                    // the parents: a child placed outside its parent's box
                    // would otherwise never be repainted.
                    region.add(self.rendered_box(*parent));
                    region.add(self.rendered_box(*previous_parent));
                    region.add(self.subtree_box(model, *child));
                    if invalidate {
                        self.invalidate_subtree(model, child.idx, &mut region, tracer);
                        if parent != previous_parent {
                            self.purge_subtree(model, child.idx, tracer);
                        }
                    }
                }
                // Descendants appear or disappear with the cell.
                Change::Visible { cell, .. } | Change::Collapsed { cell, .. } => {
                    region.add(self.subtree_box(model, *cell));
                    if invalidate {
                        self.invalidate_subtree(model, cell.idx, &mut region, tracer);
                    }
                }
                Change::Value { cell, .. } => {
                    region.add(self.rendered_box(Some(*cell)));
                    if invalidate {
                        self.invalidate_label(cell.idx, &mut region, tracer);
                    }
                }
                other => {
                    let cell = other.cell();
                    region.add(self.rendered_box(Some(cell)));
                    if invalidate {
                        self.invalidate_subtree(model, cell.idx, &mut region, tracer);
                    }
                }
            }
        }
        if !invalidate {
            for idx in core::mem::take(&mut self.touched) {
                region.add(self.state_at(idx).and_then(|s| s.bounding_box));
            }
        }
        region.rect()
    }

    /// Marks the state of `cell`, its descendants, and all their connected
    /// edges invalid, plus everything derived from them.
    ///
    /// States that were valid contribute their old bounding box to `region`.
    pub fn invalidate(&mut self, model: &GraphModel, cell: CellId) -> Option<Rect> {
        model.validate(cell);
        self.reserve_slots(model);
        let mut region = DirtyRegion::new();
        self.invalidate_subtree(model, cell.idx, &mut region, &mut Tracer::none());
        region.rect()
    }

    fn invalidate_subtree(
        &mut self,
        model: &GraphModel,
        idx: u32,
        region: &mut DirtyRegion,
        tracer: &mut Tracer<'_>,
    ) {
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            if self.state_at(i).is_some() {
                self.dirty.mark_with(i, dirty::GEOMETRY, &EagerPolicy);
            }
            // Edges whose terminal was hidden have no dependency edge to it.
            for &e in &model.edges[i as usize] {
                if self.state_at(e).is_some() {
                    self.dirty.mark_with(e, dirty::GEOMETRY, &EagerPolicy);
                }
            }
            stack.extend(&model.children[i as usize]);
        }
        let mut affected = self.drain_geometry();
        // Follow the dependencies the tracker refused as cycles.
        loop {
            let mut extra = Vec::new();
            for &(from, to) in &self.cyclic {
                if affected.contains(&to) && !affected.contains(&from) && !extra.contains(&from) {
                    extra.push(from);
                }
            }
            if extra.is_empty() {
                break;
            }
            for &e in &extra {
                self.dirty.mark_with(e, dirty::GEOMETRY, &EagerPolicy);
            }
            let more = self.drain_geometry();
            affected.extend(extra);
            for m in more {
                if !affected.contains(&m) {
                    affected.push(m);
                }
            }
        }
        self.raise_invalid(&affected, region, tracer);
    }

    fn drain_geometry(&mut self) -> Vec<u32> {
        self.dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect()
    }

    fn invalidate_label(&mut self, idx: u32, region: &mut DirtyRegion, tracer: &mut Tracer<'_>) {
        if self.state_at(idx).is_none() {
            return;
        }
        self.dirty.mark(idx, dirty::LABEL);
        let affected: Vec<u32> = self.dirty.drain(dirty::LABEL).deterministic().run().collect();
        self.raise_invalid(&affected, region, tracer);
    }

    fn raise_invalid(&mut self, slots: &[u32], region: &mut DirtyRegion, tracer: &mut Tracer<'_>) {
        for &idx in slots {
            let Some(state) = self.state_at_mut(idx) else {
                continue;
            };
            if state.invalid {
                continue;
            }
            state.invalid = true;
            region.add(state.bounding_box);
            self.touched.push(idx);
            tracer.state(idx, StateKind::Invalidated);
        }
    }

    /// Bounding box of a cell that renders. Root, layers, and cells without
    /// a state contribute nothing.
    fn rendered_box(&self, cell: Option<CellId>) -> Option<Rect> {
        cell.and_then(|c| self.state(c)).and_then(|s| s.bounding_box)
    }

    fn subtree_box(&self, model: &GraphModel, cell: CellId) -> Option<Rect> {
        let mut region = DirtyRegion::new();
        let mut stack = vec![cell.idx];
        while let Some(i) = stack.pop() {
            region.add(self.rendered_box(Some(model.handle(i))));
            stack.extend(&model.children[i as usize]);
        }
        region.rect()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use crate::geometry::Geometry;
    use crate::model::GraphModel;
    use crate::style::Stylesheet;
    use crate::view::GraphView;

    fn setup() -> (GraphModel, Stylesheet, GraphView) {
        (GraphModel::new(), Stylesheet::new(), GraphView::default())
    }

    #[test]
    fn value_change_invalidates_only_the_cell() {
        let (mut model, sheet, mut view) = setup();
        let layer = model.default_parent();
        let group = model.create_group(Geometry::new(0.0, 0.0, 100.0, 100.0), "");
        let child = model.create_vertex(Geometry::new(10.0, 10.0, 20.0, 20.0), "");
        model.begin_update();
        model.add_child(layer, group);
        model.add_child(group, child);
        let edit = model.end_update().unwrap();
        view.model_changed(&model, &sheet, &edit);

        model.begin_update();
        model.set_value(group, Some("title".into()));
        let edit = model.end_update().unwrap();
        let dirty = view.process_changes(&model, &edit.changes, true);

        assert!(view.state(group).unwrap().is_invalid());
        assert!(!view.state(child).unwrap().is_invalid());
        assert_eq!(dirty, view.state(group).unwrap().bounding_box());
    }

    #[test]
    fn geometry_change_reaches_descendants() {
        let (mut model, sheet, mut view) = setup();
        let layer = model.default_parent();
        let group = model.create_group(Geometry::new(0.0, 0.0, 100.0, 100.0), "");
        let child = model.create_vertex(Geometry::new(10.0, 10.0, 20.0, 20.0), "");
        model.begin_update();
        model.add_child(layer, group);
        model.add_child(group, child);
        let edit = model.end_update().unwrap();
        view.model_changed(&model, &sheet, &edit);

        model.begin_update();
        model.set_geometry(group, Geometry::new(50.0, 0.0, 100.0, 100.0));
        let edit = model.end_update().unwrap();
        view.process_changes(&model, &edit.changes, true);
        assert!(view.state(child).unwrap().is_invalid());

        view.validate(&model, &sheet, None);
        let dirty = view.process_changes(&model, &edit.changes, false);
        assert_eq!(
            view.state(child).unwrap().bounds(),
            Rect::new(60.0, 10.0, 80.0, 30.0)
        );
        let dirty = dirty.unwrap();
        let moved = view.state(group).unwrap().bounding_box().unwrap();
        assert_eq!(dirty.union(moved), dirty, "dirty {dirty:?} must cover {moved:?}");
    }

    #[test]
    fn removal_purges_subtree() {
        let (mut model, sheet, mut view) = setup();
        let layer = model.default_parent();
        let group = model.create_group(Geometry::new(0.0, 0.0, 100.0, 100.0), "");
        let child = model.create_vertex(Geometry::new(10.0, 10.0, 20.0, 20.0), "");
        model.begin_update();
        model.add_child(layer, group);
        model.add_child(group, child);
        let edit = model.end_update().unwrap();
        view.model_changed(&model, &sheet, &edit);
        let old_box = view.state(group).unwrap().bounding_box();

        model.begin_update();
        model.remove(group);
        let edit = model.end_update().unwrap();
        let update = view.model_changed(&model, &sheet, &edit);

        assert!(view.state(group).is_none());
        assert!(view.state(child).is_none());
        assert_eq!(update.dirty, old_box);
    }

    #[test]
    fn reparenting_out_of_a_group_reports_the_new_position() {
        let (mut model, sheet, mut view) = setup();
        let layer = model.default_parent();
        let group = model.create_group(Geometry::new(0.0, 0.0, 100.0, 100.0), "");
        let child = model.create_vertex(Geometry::new(10.0, 10.0, 20.0, 20.0), "");
        model.begin_update();
        model.add_child(layer, group);
        model.add_child(group, child);
        let edit = model.end_update().unwrap();
        view.model_changed(&model, &sheet, &edit);

        model.begin_update();
        model.add_child(layer, child);
        model.set_geometry(child, Geometry::new(500.0, 500.0, 20.0, 20.0));
        let edit = model.end_update().unwrap();
        let dirty = view.model_changed(&model, &sheet, &edit).dirty.unwrap();

        let moved = view.state(child).unwrap().bounding_box().unwrap();
        let old_group = view.state(group).unwrap().bounding_box().unwrap();
        assert_eq!(dirty.union(moved), dirty, "dirty {dirty:?} must cover {moved:?}");
        assert_eq!(dirty.union(old_group), dirty);
    }

    #[test]
    fn second_pass_reports_only_the_last_first_pass() {
        let (mut model, sheet, mut view) = setup();
        let layer = model.default_parent();
        let a = model.create_vertex(Geometry::new(0.0, 0.0, 10.0, 10.0), "");
        let b = model.create_vertex(Geometry::new(100.0, 0.0, 10.0, 10.0), "");
        model.begin_update();
        model.add_child(layer, a);
        model.add_child(layer, b);
        let edit = model.end_update().unwrap();
        view.model_changed(&model, &sheet, &edit);

        // A first pass whose second pass never runs.
        model.begin_update();
        model.set_geometry(a, Geometry::new(500.0, 500.0, 10.0, 10.0));
        let abandoned = model.end_update().unwrap();
        view.process_changes(&model, &abandoned.changes, true);

        model.begin_update();
        model.set_geometry(b, Geometry::new(120.0, 0.0, 10.0, 10.0));
        let edit = model.end_update().unwrap();
        view.process_changes(&model, &edit.changes, true);
        assert_eq!(view.touched, [b.index()]);
        view.validate(&model, &sheet, None);
        let dirty = view.process_changes(&model, &edit.changes, false);

        assert_eq!(dirty, view.state(b).unwrap().bounding_box());
        assert!(view.touched.is_empty());
    }
}
