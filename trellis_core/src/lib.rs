// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagram model, change log, and incremental view-state cache.
//!
//! `trellis_core` keeps a derived, per-cell geometric snapshot of a
//! hierarchical diagram in sync with arbitrary batches of model mutations,
//! and reports the minimal region that must be repainted after each batch.
//! Cells live in an array-based store addressed by generational handles, so
//! parent back-references and edge terminals are plain indices rather than
//! reference-counted pointers.
//!
//! # Architecture
//!
//! Every mutation flows through a transaction and comes out the other side
//! as a dirty rectangle:
//!
//! ```text
//!   Graph::begin_update()
//!       │
//!       ▼
//!   GraphModel::set_*/add/remove ──► Change log (one record per mutation)
//!       │
//!       ▼  outermost end_update()
//!   GraphView::model_changed()
//!       ├─ pass 1: old bounding boxes, invalidate, purge removed subtrees
//!       ├─ validate: re-derive invalid CellStates top-down
//!       └─ pass 2: new bounding boxes
//!       │
//!       ▼
//!   GraphChanged { dirty } ──► GraphListener::graph_changed()
//! ```
//!
//! **[`model`]**: Cell store with generational [`CellId`](model::CellId)
//! handles, reentrant transactions, and the mutation API. Each mutation is
//! applied immediately and appended to the open transaction's change log.
//!
//! **[`change`]**: [`Change`](change::Change) records and the
//! [`UndoableEdit`](change::UndoableEdit) that batches one transaction.
//!
//! **[`view`]**: [`GraphView`](view::GraphView) owns the
//! [`CellState`](view::CellState) cache. It consumes change logs, invalidates
//! through a dependency graph (children depend on parents, edges on their
//! terminals), revalidates lazily, and aggregates dirty rectangles.
//!
//! **[`dirty`]**: Invalidation channels for the view's dependency graph.
//!
//! **[`geometry`]**: The [`Geometry`](geometry::Geometry) value type.
//!
//! **[`style`]**: Style strings, resolved style maps, and the
//! [`Stylesheet`](style::Stylesheet) registry.
//!
//! **[`graph`]**: The [`Graph`](graph::Graph) facade tying model, view,
//! stylesheet, and change listeners together.
//!
//! **[`config`]**: Serializable [`ViewConfig`](config::ViewConfig).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! engine instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-state
//!   invalidation and derivation events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod change;
pub mod config;
pub mod constants;
pub mod dirty;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod style;
pub mod trace;
pub mod view;

pub use error::{Error, Result};
