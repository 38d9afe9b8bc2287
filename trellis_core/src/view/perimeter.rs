// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Perimeter projections for floating edge ends.

use core::f64::consts::{FRAC_PI_2, PI};

use kurbo::{Point, Rect};

/// How a terminal's outline is approximated when an edge end floats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Perimeter {
    /// The bounds rectangle.
    #[default]
    Rectangle,
    /// The ellipse inscribed in the bounds.
    Ellipse,
    /// No outline; ends connect to the center.
    Center,
}

impl Perimeter {
    /// Maps a style value to a perimeter. Missing or unknown names fall back
    /// to the center, matching a style that removed its perimeter.
    #[must_use]
    pub fn from_style(name: Option<&str>) -> Self {
        match name {
            Some("rectangle" | "rectanglePerimeter") => Self::Rectangle,
            Some("ellipse" | "ellipsePerimeter") => Self::Ellipse,
            _ => Self::Center,
        }
    }

    /// Projects the line from the center of `bounds` toward `next` onto the
    /// outline.
    #[must_use]
    pub fn project(self, bounds: Rect, next: Point) -> Point {
        match self {
            Self::Rectangle => rectangle(bounds, next),
            Self::Ellipse => ellipse(bounds, next),
            Self::Center => bounds.center(),
        }
    }
}

/// Intersects the ray from the center toward `next` with the rectangle.
#[must_use]
pub fn rectangle(bounds: Rect, next: Point) -> Point {
    let c = bounds.center();
    let (w, h) = (bounds.width(), bounds.height());
    if w <= 0.0 && h <= 0.0 {
        return c;
    }
    let alpha = (next.y - c.y).atan2(next.x - c.x);
    let beta = FRAC_PI_2 - alpha;
    let t = h.atan2(w);
    if alpha < -PI + t || alpha > PI - t {
        // Left side.
        Point::new(bounds.x0, c.y - w * alpha.tan() / 2.0)
    } else if alpha < -t {
        // Top side.
        Point::new(c.x - h * beta.tan() / 2.0, bounds.y0)
    } else if alpha < t {
        // Right side.
        Point::new(bounds.x1, c.y + w * alpha.tan() / 2.0)
    } else {
        // Bottom side.
        Point::new(c.x + h * beta.tan() / 2.0, bounds.y1)
    }
}

/// Intersects the ray from the center toward `next` with the inscribed
/// ellipse.
#[must_use]
pub fn ellipse(bounds: Rect, next: Point) -> Point {
    let c = bounds.center();
    let (a, b) = (bounds.width() / 2.0, bounds.height() / 2.0);
    let d = next - c;
    if a <= 0.0 || b <= 0.0 || (d.x == 0.0 && d.y == 0.0) {
        return c;
    }
    let s = 1.0 / ((d.x / a).powi(2) + (d.y / b).powi(2)).sqrt();
    c + d * s
}
