// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only rendering consumers of a [`trellis_core`] view.
//!
//! Nothing in this crate mutates the model or the view; it turns validated
//! [`CellState`](trellis_core::view::CellState)s into what a renderer needs:
//!
//! - [`PaintPlan`]: the states to draw, in paint order, optionally clipped
//!   to a dirty region
//! - [`Damage`]: accumulated repaint area across several change events
//! - [`hit_test`] and [`cells_in_rect`]: pointer and rubber-band queries

mod damage;
mod hit;
mod plan;

pub use damage::Damage;
pub use hit::{cells_in_rect, hit_test};
pub use plan::{PaintItem, PaintPlan};

use kurbo::Rect;

/// Whether two closed rectangles share at least one point.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
