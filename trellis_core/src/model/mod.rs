// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagram data model.
//!
//! A *cell* is a node in the diagram tree. Each cell has:
//!
//! - An identity ([`CellId`]), a generational handle that becomes stale when
//!   the cell is destroyed and refuses to work with any other model.
//! - Topology: a parent and an ordered child list. The root's children are
//!   *layers*; diagram content lives under layers.
//! - Properties set through the mutation API:
//!   [`geometry`](GraphModel::set_geometry), [`style`](GraphModel::set_style),
//!   [`value`](GraphModel::set_value), [`visible`](GraphModel::set_visible),
//!   and [`collapsed`](GraphModel::set_collapsed).
//! - For edges, optional [source and target](GraphModel::set_terminal)
//!   terminals. Terminals are non-owning; each terminal also lists the edges
//!   connected to it.
//!
//! Cells are stored in struct-of-arrays layout with index-based handles, so
//! the tree never needs reference counting to express back-references.
//!
//! # Transactions
//!
//! Mutations are only legal between [`GraphModel::begin_update`] and
//! [`GraphModel::end_update`]. Transactions nest; only the outermost
//! `end_update` returns the accumulated [`UndoableEdit`](crate::change::UndoableEdit).

mod id;
mod store;
mod traverse;

pub use id::{CellId, CellKind, INVALID};
pub use store::GraphModel;
pub use traverse::Children;
