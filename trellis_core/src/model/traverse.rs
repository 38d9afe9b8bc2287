// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child iteration.

use super::id::CellId;
use super::store::GraphModel;

/// Iterator over the direct children of a cell, in order.
///
/// Created by [`GraphModel::children`].
#[derive(Clone, Debug)]
pub struct Children<'a> {
    model: &'a GraphModel,
    slots: core::slice::Iter<'a, u32>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(model: &'a GraphModel, slots: &'a [u32]) -> Self {
        Self {
            model,
            slots: slots.iter(),
        }
    }
}

impl Iterator for Children<'_> {
    type Item = CellId;

    fn next(&mut self) -> Option<CellId> {
        self.slots.next().map(|&idx| self.model.handle(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<CellId> {
        self.slots.next_back().map(|&idx| self.model.handle(idx))
    }
}

impl ExactSizeIterator for Children<'_> {}
