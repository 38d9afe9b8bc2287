// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change records and undoable edits.
//!
//! Every mutation of a [`GraphModel`](crate::model::GraphModel) is applied
//! immediately and appended to the open transaction as one [`Change`]. A
//! record stores both the value it set and the value it replaced, so
//! [`Change::inverse`] is a plain field swap and undo/redo never need to
//! look at the model's current state.
//!
//! When the outermost transaction closes, its records are handed out as an
//! [`UndoableEdit`], which the view consumes exactly once to invalidate its
//! cache and compute the dirty region.

use crate::geometry::Geometry;
use crate::model::CellId;

/// One primitive mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// The model root was replaced.
    Root {
        /// The new root.
        root: CellId,
        /// The root it replaced.
        previous: CellId,
    },
    /// A cell was inserted, moved, or removed.
    Child {
        /// The cell that moved.
        child: CellId,
        /// New parent, or `None` if the cell was removed.
        parent: Option<CellId>,
        /// Index in the new parent's child list.
        index: usize,
        /// Previous parent, or `None` if the cell was newly inserted.
        previous_parent: Option<CellId>,
        /// Index in the previous parent's child list.
        previous_index: usize,
    },
    /// An edge end was connected, reconnected, or disconnected.
    Terminal {
        /// The edge.
        edge: CellId,
        /// Whether the source end changed (otherwise the target).
        is_source: bool,
        /// New terminal.
        terminal: Option<CellId>,
        /// Previous terminal.
        previous: Option<CellId>,
    },
    /// The value payload changed.
    Value {
        /// The cell.
        cell: CellId,
        /// New value.
        value: Option<String>,
        /// Previous value.
        previous: Option<String>,
    },
    /// The style string changed.
    Style {
        /// The cell.
        cell: CellId,
        /// New style string.
        style: String,
        /// Previous style string.
        previous: String,
    },
    /// The geometry was replaced.
    Geometry {
        /// The cell.
        cell: CellId,
        /// New geometry.
        geometry: Option<Geometry>,
        /// Previous geometry.
        previous: Option<Geometry>,
    },
    /// The collapsed flag changed.
    Collapsed {
        /// The cell.
        cell: CellId,
        /// New flag.
        collapsed: bool,
        /// Previous flag.
        previous: bool,
    },
    /// The visible flag changed.
    Visible {
        /// The cell.
        cell: CellId,
        /// New flag.
        visible: bool,
        /// Previous flag.
        previous: bool,
    },
}

/// The kind of a [`Change`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// [`Change::Root`].
    Root,
    /// [`Change::Child`].
    Child,
    /// [`Change::Terminal`].
    Terminal,
    /// [`Change::Value`].
    Value,
    /// [`Change::Style`].
    Style,
    /// [`Change::Geometry`].
    Geometry,
    /// [`Change::Collapsed`].
    Collapsed,
    /// [`Change::Visible`].
    Visible,
}

impl Change {
    /// Returns the kind of this record.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Root { .. } => ChangeKind::Root,
            Self::Child { .. } => ChangeKind::Child,
            Self::Terminal { .. } => ChangeKind::Terminal,
            Self::Value { .. } => ChangeKind::Value,
            Self::Style { .. } => ChangeKind::Style,
            Self::Geometry { .. } => ChangeKind::Geometry,
            Self::Collapsed { .. } => ChangeKind::Collapsed,
            Self::Visible { .. } => ChangeKind::Visible,
        }
    }

    /// Returns the cell the record is about (the new root for root changes).
    #[must_use]
    pub const fn cell(&self) -> CellId {
        match self {
            Self::Root { root, .. } => *root,
            Self::Child { child, .. } => *child,
            Self::Terminal { edge, .. } => *edge,
            Self::Value { cell, .. }
            | Self::Style { cell, .. }
            | Self::Geometry { cell, .. }
            | Self::Collapsed { cell, .. }
            | Self::Visible { cell, .. } => *cell,
        }
    }

    /// Returns the record that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self.clone() {
            Self::Root { root, previous } => Self::Root {
                root: previous,
                previous: root,
            },
            Self::Child {
                child,
                parent,
                index,
                previous_parent,
                previous_index,
            } => Self::Child {
                child,
                parent: previous_parent,
                index: previous_index,
                previous_parent: parent,
                previous_index: index,
            },
            Self::Terminal {
                edge,
                is_source,
                terminal,
                previous,
            } => Self::Terminal {
                edge,
                is_source,
                terminal: previous,
                previous: terminal,
            },
            Self::Value {
                cell,
                value,
                previous,
            } => Self::Value {
                cell,
                value: previous,
                previous: value,
            },
            Self::Style {
                cell,
                style,
                previous,
            } => Self::Style {
                cell,
                style: previous,
                previous: style,
            },
            Self::Geometry {
                cell,
                geometry,
                previous,
            } => Self::Geometry {
                cell,
                geometry: previous,
                previous: geometry,
            },
            Self::Collapsed {
                cell,
                collapsed,
                previous,
            } => Self::Collapsed {
                cell,
                collapsed: previous,
                previous: collapsed,
            },
            Self::Visible {
                cell,
                visible,
                previous,
            } => Self::Visible {
                cell,
                visible: previous,
                previous: visible,
            },
        }
    }
}

/// The ordered change log of one outermost transaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UndoableEdit {
    /// Sequence number of the transaction that produced this edit.
    pub sequence: u64,
    /// Records in the order they were applied.
    pub changes: Vec<Change>,
}

impl UndoableEdit {
    /// Returns `true` if the transaction recorded nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the records that undo this edit, in the order to apply them.
    pub fn inverse_changes(&self) -> impl Iterator<Item = Change> + '_ {
        self.changes.iter().rev().map(Change::inverse)
    }
}
