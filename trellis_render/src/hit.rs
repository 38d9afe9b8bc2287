// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point and rectangle queries over bounding boxes.

use kurbo::{Point, Rect};
use trellis_core::model::{CellId, GraphModel};
use trellis_core::view::GraphView;

use crate::plan::PaintPlan;

/// Returns the topmost cell whose bounding box contains `point`.
///
/// Topmost means last in paint order, so a child wins over its group.
#[must_use]
pub fn hit_test(model: &GraphModel, view: &GraphView, point: Point) -> Option<CellId> {
    let spot = Rect::from_origin_size(point, (0.0, 0.0));
    PaintPlan::build(model, view, Some(spot))
        .items
        .last()
        .map(|item| item.cell)
}

/// Returns the cells whose bounding box lies entirely inside `rect`, in
/// paint order.
#[must_use]
pub fn cells_in_rect(model: &GraphModel, view: &GraphView, rect: Rect) -> Vec<CellId> {
    PaintPlan::build(model, view, Some(rect))
        .items
        .into_iter()
        .filter(|item| {
            let b = item.bounding_box;
            b.x0 >= rect.x0 && b.y0 >= rect.y0 && b.x1 <= rect.x1 && b.y1 <= rect.y1
        })
        .map(|item| item.cell)
        .collect()
}
