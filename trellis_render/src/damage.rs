// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated repaint area.

use kurbo::Rect;
use trellis_core::graph::GraphChanged;

use crate::overlaps;

/// Area of the canvas that needs repainting.
///
/// A renderer that paints less often than the model changes merges the
/// dirty region of every [`GraphChanged`] event into one `Damage` and
/// repaints once.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Damage {
    /// Everything needs repainting (first frame, resize).
    Full,
    /// The rectangle needs repainting.
    Rect(Rect),
    /// Nothing changed; the previous frame can be reused.
    #[default]
    None,
}

impl Damage {
    /// Damage for a dirty rectangle as reported by the view.
    #[must_use]
    pub fn from_dirty(dirty: Option<Rect>) -> Self {
        dirty.map_or(Self::None, Self::Rect)
    }

    /// Damage for one change event.
    #[must_use]
    pub fn from_event(event: &GraphChanged) -> Self {
        Self::from_dirty(event.dirty)
    }

    /// Returns `true` if nothing needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage value into this one.
    pub fn merge(&mut self, other: Self) {
        *self = match (*self, other) {
            (Self::Full, _) | (_, Self::Full) => Self::Full,
            (Self::None, d) | (d, Self::None) => d,
            (Self::Rect(a), Self::Rect(b)) => Self::Rect(a.union(b)),
        };
    }

    /// Returns the clip to paint with: `None` paints everything.
    ///
    /// Returns `Some(None)` when nothing needs painting.
    #[must_use]
    pub fn clip(&self) -> Option<Option<Rect>> {
        match self {
            Self::Full => Some(None),
            Self::Rect(r) => Some(Some(*r)),
            Self::None => None,
        }
    }

    /// Whether a box drawn at `rect` must be repainted.
    #[must_use]
    pub fn touches(&self, rect: Rect) -> bool {
        match self {
            Self::Full => true,
            Self::Rect(r) => overlaps(*r, rect),
            Self::None => false,
        }
    }
}
