// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-rectangle accumulation.

use kurbo::Rect;

/// Accumulates the union of repaint contributions.
///
/// Starts empty. An empty result means "nothing to repaint", never
/// "repaint everything".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirtyRegion {
    rect: Option<Rect>,
}

impl DirtyRegion {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rect: None }
    }

    /// Unions a contribution into the region. `None` is ignored.
    pub fn add(&mut self, contribution: Option<Rect>) {
        if let Some(r) = contribution {
            self.rect = Some(match self.rect {
                Some(acc) => acc.union(r),
                None => r,
            });
        }
    }

    /// Unions another region into this one.
    pub fn merge(&mut self, other: Self) {
        self.add(other.rect);
    }

    /// Returns the accumulated rectangle.
    #[must_use]
    pub const fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Returns `true` if nothing was added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rect.is_none()
    }
}

/// Unions two optional rectangles.
#[must_use]
pub fn union_rects(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    let mut region = DirtyRegion::new();
    region.add(a);
    region.add(b);
    region.rect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_stays_empty() {
        let mut region = DirtyRegion::new();
        region.add(None);
        assert!(region.is_empty());
        assert_eq!(region.rect(), None);
    }

    #[test]
    fn contributions_union() {
        let mut region = DirtyRegion::new();
        region.add(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        region.add(None);
        region.add(Some(Rect::new(20.0, 5.0, 30.0, 15.0)));
        assert_eq!(region.rect(), Some(Rect::new(0.0, 0.0, 30.0, 15.0)));
    }

    #[test]
    fn merge_and_union_helper_agree() {
        let a = Some(Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = Some(Rect::new(-1.0, 2.0, 0.0, 3.0));
        let mut left = DirtyRegion::new();
        left.add(a);
        let mut right = DirtyRegion::new();
        right.add(b);
        left.merge(right);
        assert_eq!(left.rect(), union_rects(a, b));
        assert_eq!(union_rects(None, None), None);
    }
}
