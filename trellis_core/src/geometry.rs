// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell geometry.
//!
//! A [`Geometry`] is a value: the model never edits one in place. Callers
//! clone the current geometry, change the copy, and hand it back through
//! [`GraphModel::set_geometry`](crate::model::GraphModel::set_geometry), so
//! the change log can keep the previous value for undo.

use kurbo::{Point, Rect, Size, Vec2};

/// Position and size of a cell, or the routing hints of an edge.
///
/// For vertices, `x`/`y` are relative to the parent's origin unless
/// [`relative`](Self::relative) is set, in which case they are fractions of
/// the parent's size (or, for a parent edge, a position along the edge in
/// `-1.0..=1.0` and an orthogonal distance).
///
/// For edges, `x`/`y` place the label along the path the same way, and
/// [`points`](Self::points) holds the user-defined waypoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Horizontal position, or a fraction when relative.
    pub x: f64,
    /// Vertical position, or a fraction when relative.
    pub y: f64,
    /// Width, never negative.
    pub width: f64,
    /// Height, never negative.
    pub height: f64,
    /// Whether `x`/`y` are fractions of the parent instead of coordinates.
    pub relative: bool,
    /// Label displacement in unscaled units.
    pub offset: Option<Vec2>,
    /// Ordered edge waypoints in the parent's coordinate frame.
    pub points: Vec<Point>,
    /// Bounds to swap in when the cell is folded or unfolded.
    pub alternate_bounds: Option<Rect>,
    /// Loose source end, used when the edge has no source terminal.
    pub source_point: Option<Point>,
    /// Loose target end, used when the edge has no target terminal.
    pub target_point: Option<Point>,
}

impl Geometry {
    /// Creates an absolute geometry. Negative sizes are clamped to zero.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
            ..Self::default()
        }
    }

    /// Creates a relative geometry at the given fractions of the parent.
    #[must_use]
    pub fn relative(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            relative: true,
            ..Self::new(x, y, width, height)
        }
    }

    /// Creates the default geometry for a new edge: relative, label centered.
    #[must_use]
    pub fn edge() -> Self {
        Self {
            relative: true,
            ..Self::default()
        }
    }

    /// Replaces the waypoints.
    #[must_use]
    pub fn with_points(mut self, points: impl IntoIterator<Item = Point>) -> Self {
        self.points = points.into_iter().collect();
        self
    }

    /// Sets the label offset.
    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the loose source or target end point.
    #[must_use]
    pub fn with_terminal_point(mut self, point: Point, is_source: bool) -> Self {
        if is_source {
            self.source_point = Some(point);
        } else {
            self.target_point = Some(point);
        }
        self
    }

    /// Sets the bounds used when the cell is folded.
    #[must_use]
    pub fn with_alternate_bounds(mut self, bounds: Rect) -> Self {
        self.alternate_bounds = Some(bounds);
        self
    }

    /// Returns the loose end point for the given side.
    #[must_use]
    pub fn terminal_point(&self, is_source: bool) -> Option<Point> {
        if is_source {
            self.source_point
        } else {
            self.target_point
        }
    }

    /// Returns `x, y, width, height` as a rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(
            Point::new(self.x, self.y),
            Size::new(self.width.max(0.0), self.height.max(0.0)),
        )
    }

    /// Returns a copy moved by `(dx, dy)`.
    ///
    /// Relative geometries keep their fractions; waypoints and loose end
    /// points always move.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let delta = Vec2::new(dx, dy);
        let mut moved = self.clone();
        if !moved.relative {
            moved.x += dx;
            moved.y += dy;
        }
        for p in &mut moved.points {
            *p += delta;
        }
        if let Some(p) = &mut moved.source_point {
            *p += delta;
        }
        if let Some(p) = &mut moved.target_point {
            *p += delta;
        }
        moved
    }

    /// Returns a copy whose bounds are exchanged with the alternate bounds.
    ///
    /// Returns an unchanged copy when no alternate bounds are set. The
    /// alternate rectangle keeps its own origin; the swapped-in bounds keep
    /// the current origin so the folded cell stays in place.
    #[must_use]
    pub fn swapped_alternate_bounds(&self) -> Self {
        let mut swapped = self.clone();
        if let Some(alt) = self.alternate_bounds {
            swapped.alternate_bounds = Some(self.bounds());
            swapped.width = alt.width().max(0.0);
            swapped.height = alt.height().max(0.0);
        }
        swapped
    }
}
