// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached per-cell view state.

use kurbo::{Point, Rect, Vec2};

use crate::model::{CellId, CellKind};
use crate::style::Style;

/// The derived geometric snapshot of one visible cell.
///
/// All rectangles and points are in absolute (scaled, translated) view
/// coordinates, except [`origin`](Self::origin), which is in unscaled model
/// coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct CellState {
    pub(crate) cell: CellId,
    pub(crate) kind: CellKind,
    pub(crate) origin: Point,
    pub(crate) absolute_offset: Vec2,
    pub(crate) bounds: Rect,
    pub(crate) points: Vec<Point>,
    pub(crate) length: f64,
    pub(crate) label_bounds: Option<Rect>,
    pub(crate) bounding_box: Option<Rect>,
    pub(crate) style: Style,
    pub(crate) visible_source: Option<CellId>,
    pub(crate) visible_target: Option<CellId>,
    pub(crate) invalid: bool,
    /// Slots this state recorded dependency edges to at its last derivation.
    pub(crate) deps: Vec<u32>,
}

impl CellState {
    pub(crate) fn new(cell: CellId, kind: CellKind) -> Self {
        Self {
            cell,
            kind,
            origin: Point::ZERO,
            absolute_offset: Vec2::ZERO,
            bounds: Rect::ZERO,
            points: Vec::new(),
            length: 0.0,
            label_bounds: None,
            bounding_box: None,
            style: Style::new(),
            visible_source: None,
            visible_target: None,
            invalid: true,
            deps: Vec::new(),
        }
    }

    /// The cell this state belongs to.
    #[must_use]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// The cell's kind at the time of derivation.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// Accumulated unscaled translation contributed by the ancestors; the
    /// frame in which the cell's children interpret their geometry.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Absolute bounds. For edges, the envelope of [`points`](Self::points).
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Absolute routing points of an edge: source end, waypoints, target
    /// end. Ends that cannot be resolved are omitted.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Total polyline length of an edge.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Absolute label box, if the cell has one.
    #[must_use]
    pub fn label_bounds(&self) -> Option<Rect> {
        self.label_bounds
    }

    /// Painted extent: bounds and label grown by rotation, stroke, and
    /// shadow. `None` for cells that do not render (root, layers, cells
    /// without geometry).
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        self.bounding_box
    }

    /// Whether the state contributes to painting and dirty regions.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.bounding_box.is_some()
    }

    /// Resolved style mapping.
    #[must_use]
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// The visible cell standing in for the edge's source, if any.
    #[must_use]
    pub fn visible_source(&self) -> Option<CellId> {
        self.visible_source
    }

    /// The visible cell standing in for the edge's target, if any.
    #[must_use]
    pub fn visible_target(&self) -> Option<CellId> {
        self.visible_target
    }

    /// The visible terminal for the given end.
    #[must_use]
    pub fn visible_terminal(&self, is_source: bool) -> Option<CellId> {
        if is_source {
            self.visible_source
        } else {
            self.visible_target
        }
    }

    /// Whether the state awaits re-derivation.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Returns the center of the absolute bounds.
    #[must_use]
    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    /// Returns the point at `fraction` (0..=1) of the edge's length, moved
    /// `normal` units to the left of the path direction.
    ///
    /// Returns `None` for states without points.
    #[must_use]
    pub fn point_along(&self, fraction: f64, normal: f64) -> Option<Point> {
        let first = *self.points.first()?;
        if self.points.len() == 1 || self.length <= 0.0 {
            return Some(first);
        }
        let target = fraction.clamp(0.0, 1.0) * self.length;
        let mut walked = 0.0;
        for pair in self.points.windows(2) {
            let seg = pair[1] - pair[0];
            let len = seg.hypot();
            if len > 0.0 && walked + len >= target {
                let t = (target - walked) / len;
                let dir = seg / len;
                let left = Vec2::new(-dir.y, dir.x);
                return Some(pair[0].lerp(pair[1], t) + left * normal);
            }
            walked += len;
        }
        self.points.last().copied()
    }
}
