// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell identity types.

use core::fmt;

/// Sentinel value indicating "no cell" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a cell in a [`GraphModel`](super::GraphModel).
///
/// Contains a slot index, a generation counter so that stale handles can be
/// detected after a cell is destroyed and the slot is reused, and a tag
/// naming the model that issued it so that handles cannot cross models.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId {
    /// Slot index into the model's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the model's generation for this slot.
    pub(crate) generation: u32,
    /// Tag of the issuing model.
    pub(crate) model: u32,
}

impl CellId {
    /// Returns the raw slot index (for diagnostics and dense side tables).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({}@gen{})", self.idx, self.generation)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.idx)
    }
}

/// What a cell is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// A node with bounds.
    #[default]
    Vertex,
    /// A connection between two terminals, routed through waypoints.
    Edge,
    /// A container whose children are positioned relative to it.
    Group,
}

impl CellKind {
    /// Returns `true` for [`CellKind::Edge`].
    #[inline]
    #[must_use]
    pub const fn is_edge(self) -> bool {
        matches!(self, Self::Edge)
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::Group => "group",
        }
    }
}
