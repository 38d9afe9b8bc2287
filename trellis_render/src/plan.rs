// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint plan: the validated states to draw, in paint order.

use kurbo::{Point, Rect};
use trellis_core::model::{CellId, CellKind, GraphModel};
use trellis_core::view::GraphView;

use crate::overlaps;

/// One cell to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintItem {
    /// The cell.
    pub cell: CellId,
    /// Vertex, edge, or group.
    pub kind: CellKind,
    /// Area the cell paints, including label, stroke, and shadow.
    pub bounding_box: Rect,
    /// Absolute bounds (for edges, the envelope of the points).
    pub bounds: Rect,
    /// Absolute edge points. Empty for vertices.
    pub points: Vec<Point>,
    /// Label box, if the cell has one.
    pub label_bounds: Option<Rect>,
}

/// Cells to draw, back to front.
///
/// Paint order is a pre-order walk of the model: parents before children,
/// siblings in child order.
#[derive(Clone, Debug, Default)]
pub struct PaintPlan {
    /// Items in back-to-front order.
    pub items: Vec<PaintItem>,
}

impl PaintPlan {
    /// Builds a plan from every valid, rendered state whose bounding box
    /// meets `clip` (or every one, if `clip` is `None`).
    #[must_use]
    pub fn build(model: &GraphModel, view: &GraphView, clip: Option<Rect>) -> Self {
        let mut plan = Self::default();
        plan.rebuild(model, view, clip);
        plan
    }

    /// Rebuilds the plan in place, reusing its allocation.
    pub fn rebuild(&mut self, model: &GraphModel, view: &GraphView, clip: Option<Rect>) {
        self.items.clear();
        for cell in model.descendants(model.root()) {
            let Some(state) = view.state(cell).filter(|s| !s.is_invalid()) else {
                continue;
            };
            let Some(bounding_box) = state.bounding_box() else {
                continue;
            };
            if clip.is_some_and(|c| !overlaps(c, bounding_box)) {
                continue;
            }
            self.items.push(PaintItem {
                cell,
                kind: state.kind(),
                bounding_box,
                bounds: state.bounds(),
                points: state.points().to_vec(),
                label_bounds: state.label_bounds(),
            });
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items back to front.
    pub fn iter(&self) -> core::slice::Iter<'_, PaintItem> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::geometry::Geometry;
    use trellis_core::graph::Graph;

    use super::*;

    #[test]
    fn parents_paint_before_children() {
        let mut graph = Graph::new();
        let group = graph.insert_group(None, Geometry::new(0.0, 0.0, 100.0, 100.0), "");
        let child = graph.insert_vertex(Some(group), Geometry::new(10.0, 10.0, 10.0, 10.0), "");
        let later = graph.insert_vertex(None, Geometry::new(200.0, 0.0, 10.0, 10.0), "");

        let plan = PaintPlan::build(graph.model(), graph.view(), None);
        let order: Vec<CellId> = plan.iter().map(|i| i.cell).collect();
        assert_eq!(order, vec![group, child, later], "root and layer never paint");
    }

    #[test]
    fn clip_keeps_only_touching_items() {
        let mut graph = Graph::new();
        let left = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "");
        graph.insert_vertex(None, Geometry::new(500.0, 0.0, 10.0, 10.0), "");

        let plan = PaintPlan::build(
            graph.model(),
            graph.view(),
            Some(Rect::new(-5.0, -5.0, 5.0, 5.0)),
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items[0].cell, left);
    }

    #[test]
    fn edges_carry_points() {
        let mut graph = Graph::new();
        let a = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "");
        let b = graph.insert_vertex(None, Geometry::new(100.0, 0.0, 10.0, 10.0), "");
        let e = graph.insert_edge(None, Some(a), Some(b), "");
        let plan = PaintPlan::build(graph.model(), graph.view(), None);
        let item = plan.iter().find(|i| i.cell == e).unwrap();
        assert_eq!(item.kind, CellKind::Edge);
        assert_eq!(item.points.len(), 2);
        let expected = [Point::new(10.0, 5.0), Point::new(100.0, 5.0)];
        for (p, q) in item.points.iter().zip(expected) {
            assert!(p.distance(q) < 1e-9, "{p:?} != {q:?}");
        }
    }
}
