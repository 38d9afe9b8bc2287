// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation channel constants.
//!
//! The view uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! find every [`CellState`](crate::view::CellState) that a change reaches.
//! Keys are raw cell slot indices.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] is marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy). Each derived state
//!   records dependency edges on this channel: a child depends on its parent
//!   (its origin is the parent's origin), and an edge depends on the states
//!   of its visible source and target (its end points sit on their
//!   perimeters). Marking a state therefore marks every state whose geometry
//!   was derived from it, transitively.
//!
//! - **Local-only**: [`LABEL`] is marked with the default policy. Value
//!   changes only affect the cell's own label, so only the marked state is
//!   drained.
//!
//! # Consumption
//!
//! Invalidation drains both channels immediately and raises the `invalid`
//! flag on each drained state. Validation then re-derives exactly those
//! states, top-down.

use understory_dirty::Channel;

/// Position, size, style, or ancestry changed; dependents must be re-derived.
pub const GEOMETRY: Channel = Channel::new(0);

/// Label content changed; only the cell itself is re-derived.
pub const LABEL: Channel = Channel::new(1);
