// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays cell storage with allocation, topology, and transactional
//! mutation.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

use crate::change::{Change, UndoableEdit};
use crate::geometry::Geometry;

use super::id::{CellId, CellKind, INVALID};
use super::traverse::Children;

static NEXT_MODEL_TAG: AtomicU32 = AtomicU32::new(0);

/// Struct-of-arrays storage for all cells, plus the open transaction.
///
/// Cells are addressed by [`CellId`] handles. Internally, each cell occupies
/// a slot in parallel arrays; parents are stored as raw slot indices and
/// children as ordered index lists, so the store alone owns every cell.
/// Destroyed cells are recycled via a free list, and generation counters
/// prevent stale handle access.
///
/// A new model has a root with one child, the default layer. Top-level
/// diagram content goes under a layer (see
/// [`default_parent`](Self::default_parent)).
///
/// Every mutation must happen between [`begin_update`](Self::begin_update)
/// and [`end_update`](Self::end_update). Mutations apply immediately and
/// append one [`Change`] to the open transaction; the outermost
/// `end_update` hands the batch out as an [`UndoableEdit`].
#[derive(Debug)]
pub struct GraphModel {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Cell properties --
    pub(crate) kind: Vec<CellKind>,
    pub(crate) geometry: Vec<Option<Geometry>>,
    pub(crate) style: Vec<String>,
    pub(crate) value: Vec<Option<String>>,
    pub(crate) visible: Vec<bool>,
    pub(crate) collapsed: Vec<bool>,

    // -- Edge relations (non-owning) --
    pub(crate) source: Vec<u32>,
    pub(crate) target: Vec<u32>,
    pub(crate) edges: Vec<Vec<u32>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    tag: u32,
    root: u32,

    // -- Transactions --
    update_level: u32,
    current: Vec<Change>,
    sequence: u64,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel {
    /// Creates a model holding a root and one empty layer.
    #[must_use]
    pub fn new() -> Self {
        let mut model = Self {
            parent: Vec::new(),
            children: Vec::new(),
            kind: Vec::new(),
            geometry: Vec::new(),
            style: Vec::new(),
            value: Vec::new(),
            visible: Vec::new(),
            collapsed: Vec::new(),
            source: Vec::new(),
            target: Vec::new(),
            edges: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            tag: NEXT_MODEL_TAG.fetch_add(1, Ordering::Relaxed),
            root: INVALID,
            update_level: 0,
            current: Vec::new(),
            sequence: 0,
        };
        let root = model.alloc(CellKind::Group);
        let layer = model.alloc(CellKind::Group);
        model.root = root;
        model.link(root, layer, usize::MAX);
        model
    }

    // -- Allocation API --

    /// Creates a detached vertex.
    pub fn create_vertex(&mut self, geometry: Geometry, style: impl Into<String>) -> CellId {
        let idx = self.alloc(CellKind::Vertex);
        self.geometry[idx as usize] = Some(geometry);
        self.style[idx as usize] = style.into();
        self.handle(idx)
    }

    /// Creates a detached group (a vertex whose children are positioned
    /// relative to it).
    pub fn create_group(&mut self, geometry: Geometry, style: impl Into<String>) -> CellId {
        let idx = self.alloc(CellKind::Group);
        self.geometry[idx as usize] = Some(geometry);
        self.style[idx as usize] = style.into();
        self.handle(idx)
    }

    /// Creates a detached layer: a geometry-less group meant to be added to
    /// the root.
    pub fn create_layer(&mut self) -> CellId {
        let idx = self.alloc(CellKind::Group);
        self.handle(idx)
    }

    /// Creates a detached edge connected to the given terminals.
    ///
    /// # Panics
    ///
    /// Panics if a terminal handle is stale or belongs to another model.
    pub fn create_edge(
        &mut self,
        source: Option<CellId>,
        target: Option<CellId>,
        style: impl Into<String>,
    ) -> CellId {
        for terminal in [source, target].into_iter().flatten() {
            self.validate(terminal);
        }
        let idx = self.alloc(CellKind::Edge);
        self.geometry[idx as usize] = Some(Geometry::edge());
        self.style[idx as usize] = style.into();
        if let Some(s) = source {
            self.set_terminal_raw(idx, s.idx, true);
        }
        if let Some(t) = target {
            self.set_terminal_raw(idx, t.idx, false);
        }
        self.handle(idx)
    }

    /// Destroys a detached cell, freeing its slot for reuse.
    ///
    /// Old handles to the cell become stale, so edits that mention it can no
    /// longer be undone.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if a transaction is open, or if the
    /// cell is the root, is attached, has children, or has connected edges.
    pub fn destroy_cell(&mut self, id: CellId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.update_level == 0,
            "cannot destroy a cell inside a transaction"
        );
        assert!(idx != self.root, "cannot destroy the root");
        assert!(
            self.parent[idx as usize] == INVALID,
            "cannot destroy an attached cell"
        );
        assert!(
            self.children[idx as usize].is_empty(),
            "cannot destroy cell with children"
        );
        assert!(
            self.edges[idx as usize].is_empty(),
            "cannot destroy cell with connected edges"
        );

        if self.source[idx as usize] != INVALID {
            self.set_terminal_raw(idx, INVALID, true);
        }
        if self.target[idx as usize] != INVALID {
            self.set_terminal_raw(idx, INVALID, false);
        }

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live cell of this model.
    #[must_use]
    pub fn is_alive(&self, id: CellId) -> bool {
        id.model == self.tag
            && id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of allocated slots (live or free).
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.len
    }

    // -- Topology API --

    /// Returns the current root.
    #[must_use]
    pub fn root(&self) -> CellId {
        self.handle(self.root)
    }

    /// Returns the first layer, or the root if it has no children.
    #[must_use]
    pub fn default_parent(&self) -> CellId {
        match self.children[self.root as usize].first() {
            Some(&layer) => self.handle(layer),
            None => self.root(),
        }
    }

    /// Returns the parent of a cell, if any.
    #[must_use]
    pub fn parent(&self, id: CellId) -> Option<CellId> {
        self.validate(id);
        self.opt_handle(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a cell, in order.
    #[must_use]
    pub fn children(&self, id: CellId) -> Children<'_> {
        self.validate(id);
        Children::new(self, &self.children[id.idx as usize])
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(&self, id: CellId) -> usize {
        self.validate(id);
        self.children[id.idx as usize].len()
    }

    /// Returns the child at `index`, if any.
    #[must_use]
    pub fn child_at(&self, id: CellId, index: usize) -> Option<CellId> {
        self.validate(id);
        self.children[id.idx as usize]
            .get(index)
            .map(|&c| self.handle(c))
    }

    /// Returns the position of a cell in its parent's child list.
    #[must_use]
    pub fn index_of(&self, id: CellId) -> Option<usize> {
        self.validate(id);
        self.slot_index_in_parent(id.idx)
    }

    /// Returns `true` if `ancestor` is `cell` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: CellId, cell: CellId) -> bool {
        self.validate(ancestor);
        self.validate(cell);
        self.slot_is_ancestor(ancestor.idx, cell.idx)
    }

    /// Returns `true` if the cell is reachable from the current root.
    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.validate(id);
        self.slot_is_ancestor(self.root, id.idx)
    }

    /// Returns `true` if the cell is a direct child of the root.
    #[must_use]
    pub fn is_layer(&self, id: CellId) -> bool {
        self.validate(id);
        self.parent[id.idx as usize] == self.root
    }

    /// Returns the cell and all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, id: CellId) -> Vec<CellId> {
        self.validate(id);
        let mut out = Vec::new();
        let mut stack = vec![id.idx];
        while let Some(idx) = stack.pop() {
            out.push(self.handle(idx));
            stack.extend(self.children[idx as usize].iter().rev());
        }
        out
    }

    // -- Property getters (read-only) --

    /// Returns the kind of a cell.
    #[must_use]
    pub fn kind(&self, id: CellId) -> CellKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// Returns `true` if the cell is an edge.
    #[must_use]
    pub fn is_edge(&self, id: CellId) -> bool {
        self.kind(id).is_edge()
    }

    /// Returns the geometry of a cell.
    #[must_use]
    pub fn geometry(&self, id: CellId) -> Option<&Geometry> {
        self.validate(id);
        self.geometry[id.idx as usize].as_ref()
    }

    /// Returns the style string of a cell.
    #[must_use]
    pub fn style(&self, id: CellId) -> &str {
        self.validate(id);
        &self.style[id.idx as usize]
    }

    /// Returns the value payload of a cell.
    #[must_use]
    pub fn value(&self, id: CellId) -> Option<&str> {
        self.validate(id);
        self.value[id.idx as usize].as_deref()
    }

    /// Returns the cell's own visible flag (ancestors are not consulted).
    #[must_use]
    pub fn is_visible(&self, id: CellId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the collapsed flag.
    #[must_use]
    pub fn is_collapsed(&self, id: CellId) -> bool {
        self.validate(id);
        self.collapsed[id.idx as usize]
    }

    /// Returns the source or target of an edge.
    #[must_use]
    pub fn terminal(&self, edge: CellId, is_source: bool) -> Option<CellId> {
        self.validate(edge);
        let t = if is_source {
            self.source[edge.idx as usize]
        } else {
            self.target[edge.idx as usize]
        };
        self.opt_handle(t)
    }

    /// Returns the edges whose source or target is the given cell.
    pub fn edges_of(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.validate(id);
        self.edges[id.idx as usize].iter().map(|&e| self.handle(e))
    }

    /// Returns the edges connecting `a` and `b`.
    ///
    /// With `directed`, only edges from `a` to `b` are returned.
    #[must_use]
    pub fn edges_between(&self, a: CellId, b: CellId, directed: bool) -> Vec<CellId> {
        self.validate(b);
        self.edges_of(a)
            .filter(|&e| {
                let s = self.source[e.idx as usize];
                let t = self.target[e.idx as usize];
                (s == a.idx && t == b.idx) || (!directed && s == b.idx && t == a.idx)
            })
            .collect()
    }

    // -- Transactions --

    /// Opens (or nests) a transaction.
    pub fn begin_update(&mut self) {
        self.update_level += 1;
    }

    /// Closes a transaction.
    ///
    /// Returns the batched edit when the outermost transaction closes, and
    /// `None` for nested ones. The edit may be empty.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is open.
    pub fn end_update(&mut self) -> Option<UndoableEdit> {
        assert!(
            self.update_level > 0,
            "end_update without matching begin_update"
        );
        self.update_level -= 1;
        if self.update_level > 0 {
            return None;
        }
        self.sequence += 1;
        Some(UndoableEdit {
            sequence: self.sequence,
            changes: core::mem::take(&mut self.current),
        })
    }

    /// Returns the current transaction nesting depth.
    #[must_use]
    pub fn update_level(&self) -> u32 {
        self.update_level
    }

    /// Returns the records applied so far in the open transaction.
    #[must_use]
    pub fn pending_changes(&self) -> &[Change] {
        &self.current
    }

    // -- Mutation API (records one change each) --

    /// Inserts or moves `child` under `parent` at `index`.
    ///
    /// An index past the end appends. When moving within the same parent,
    /// `index` is the final position. Returns `false`, recording nothing, if
    /// the move would make a cell its own ancestor or would move the root.
    ///
    /// # Panics
    ///
    /// Panics if a handle is invalid or no transaction is open.
    pub fn add(&mut self, parent: CellId, child: CellId, index: usize) -> bool {
        self.require_transaction();
        self.validate(parent);
        self.validate(child);
        if child.idx == self.root || self.slot_is_ancestor(child.idx, parent.idx) {
            trace!(?child, ?parent, "rejected move under own descendant");
            return false;
        }
        let previous_parent = self.opt_handle(self.parent[child.idx as usize]);
        let previous_index = self.slot_index_in_parent(child.idx).unwrap_or(0);
        let mut len = self.children[parent.idx as usize].len();
        if previous_parent == Some(parent) {
            len -= 1;
        }
        self.execute(Change::Child {
            child,
            parent: Some(parent),
            index: index.min(len),
            previous_parent,
            previous_index,
        });
        true
    }

    /// Appends `child` as the last child of `parent`. See [`add`](Self::add).
    pub fn add_child(&mut self, parent: CellId, child: CellId) -> bool {
        self.add(parent, child, usize::MAX)
    }

    /// Detaches a cell (and its subtree) from its parent.
    ///
    /// The cell stays alive so the removal can be undone. Returns `false` if
    /// the cell has no parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn remove(&mut self, cell: CellId) -> bool {
        self.require_transaction();
        self.validate(cell);
        let Some(previous_parent) = self.opt_handle(self.parent[cell.idx as usize]) else {
            return false;
        };
        let previous_index = self.slot_index_in_parent(cell.idx).unwrap_or(0);
        self.execute(Change::Child {
            child: cell,
            parent: None,
            index: 0,
            previous_parent: Some(previous_parent),
            previous_index,
        });
        true
    }

    /// Replaces the root. The new root must be detached.
    ///
    /// Returns `false` if `root` has a parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn set_root(&mut self, root: CellId) -> bool {
        self.require_transaction();
        self.validate(root);
        if self.parent[root.idx as usize] != INVALID {
            return false;
        }
        let previous = self.root();
        self.execute(Change::Root { root, previous });
        true
    }

    /// Connects an edge end to `terminal`, or disconnects it with `None`.
    ///
    /// Returns `false` if the edge would connect to itself.
    ///
    /// # Panics
    ///
    /// Panics if a handle is invalid, `edge` is not an edge, or no
    /// transaction is open.
    pub fn set_terminal(&mut self, edge: CellId, terminal: Option<CellId>, is_source: bool) -> bool {
        self.require_transaction();
        self.validate(edge);
        assert!(
            self.kind[edge.idx as usize].is_edge(),
            "set_terminal on non-edge {edge:?}"
        );
        if let Some(t) = terminal {
            self.validate(t);
            if t == edge {
                return false;
            }
        }
        let previous = self.terminal(edge, is_source);
        self.execute(Change::Terminal {
            edge,
            is_source,
            terminal,
            previous,
        });
        true
    }

    /// Replaces the value payload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn set_value(&mut self, cell: CellId, value: Option<String>) {
        self.require_transaction();
        self.validate(cell);
        let previous = self.value[cell.idx as usize].clone();
        self.execute(Change::Value {
            cell,
            value,
            previous,
        });
    }

    /// Replaces the style string.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn set_style(&mut self, cell: CellId, style: impl Into<String>) {
        self.require_transaction();
        self.validate(cell);
        let previous = self.style[cell.idx as usize].clone();
        self.execute(Change::Style {
            cell,
            style: style.into(),
            previous,
        });
    }

    /// Replaces the geometry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn set_geometry(&mut self, cell: CellId, geometry: Geometry) {
        self.require_transaction();
        self.validate(cell);
        let previous = self.geometry[cell.idx as usize].clone();
        self.execute(Change::Geometry {
            cell,
            geometry: Some(geometry),
            previous,
        });
    }

    /// Sets the visible flag.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn set_visible(&mut self, cell: CellId, visible: bool) {
        self.require_transaction();
        self.validate(cell);
        let previous = self.visible[cell.idx as usize];
        self.execute(Change::Visible {
            cell,
            visible,
            previous,
        });
    }

    /// Sets the collapsed flag.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid or no transaction is open.
    pub fn set_collapsed(&mut self, cell: CellId, collapsed: bool) {
        self.require_transaction();
        self.validate(cell);
        let previous = self.collapsed[cell.idx as usize];
        self.execute(Change::Collapsed {
            cell,
            collapsed,
            previous,
        });
    }

    /// Applies the inverse of every record of `edit`, newest first.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is open or the edit mentions a destroyed
    /// cell.
    pub fn undo(&mut self, edit: &UndoableEdit) {
        self.require_transaction();
        for change in edit.inverse_changes() {
            self.validate_change(&change);
            self.execute(change);
        }
    }

    /// Re-applies every record of `edit`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is open or the edit mentions a destroyed
    /// cell.
    pub fn redo(&mut self, edit: &UndoableEdit) {
        self.require_transaction();
        for change in &edit.changes {
            self.validate_change(change);
            self.execute(change.clone());
        }
    }

    // -- Internal helpers --

    /// Panics if the handle is stale or was issued by another model.
    pub(crate) fn validate(&self, id: CellId) {
        assert!(
            id.model == self.tag,
            "CellId {id:?} belongs to another model"
        );
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale CellId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn validate_change(&self, change: &Change) {
        match change {
            Change::Root { root, previous } => {
                self.validate(*root);
                self.validate(*previous);
            }
            Change::Child {
                child,
                parent,
                previous_parent,
                ..
            } => {
                self.validate(*child);
                for p in [parent, previous_parent].into_iter().flatten() {
                    self.validate(*p);
                }
            }
            Change::Terminal {
                edge,
                terminal,
                previous,
                ..
            } => {
                self.validate(*edge);
                for t in [terminal, previous].into_iter().flatten() {
                    self.validate(*t);
                }
            }
            other => self.validate(other.cell()),
        }
    }

    fn require_transaction(&self) {
        assert!(
            self.update_level > 0,
            "model mutation outside of a transaction; call begin_update first"
        );
    }

    /// Builds a handle for a live slot.
    pub(crate) fn handle(&self, idx: u32) -> CellId {
        CellId {
            idx,
            generation: self.generation[idx as usize],
            model: self.tag,
        }
    }

    pub(crate) fn opt_handle(&self, idx: u32) -> Option<CellId> {
        if idx == INVALID {
            None
        } else {
            Some(self.handle(idx))
        }
    }

    fn alloc(&mut self, kind: CellKind) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.kind[i] = kind;
            self.geometry[i] = None;
            self.style[i].clear();
            self.value[i] = None;
            self.visible[i] = true;
            self.collapsed[i] = false;
            self.source[i] = INVALID;
            self.target[i] = INVALID;
            self.edges[i].clear();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.kind.push(kind);
            self.geometry.push(None);
            self.style.push(String::new());
            self.value.push(None);
            self.visible.push(true);
            self.collapsed.push(false);
            self.source.push(INVALID);
            self.target.push(INVALID);
            self.edges.push(Vec::new());
            self.generation.push(0);
            idx
        }
    }

    /// Applies a record to the arrays and appends it to the open log.
    fn execute(&mut self, change: Change) {
        match &change {
            Change::Root { root, .. } => self.root = root.idx,
            Change::Child {
                child,
                parent,
                index,
                ..
            } => {
                if self.parent[child.idx as usize] != INVALID {
                    self.unlink(child.idx);
                }
                if let Some(p) = parent {
                    self.link(p.idx, child.idx, *index);
                }
            }
            Change::Terminal {
                edge,
                is_source,
                terminal,
                ..
            } => {
                let t = terminal.map_or(INVALID, |t| t.idx);
                self.set_terminal_raw(edge.idx, t, *is_source);
            }
            Change::Value { cell, value, .. } => {
                self.value[cell.idx as usize].clone_from(value);
            }
            Change::Style { cell, style, .. } => {
                self.style[cell.idx as usize].clone_from(style);
            }
            Change::Geometry { cell, geometry, .. } => {
                self.geometry[cell.idx as usize].clone_from(geometry);
            }
            Change::Collapsed {
                cell, collapsed, ..
            } => self.collapsed[cell.idx as usize] = *collapsed,
            Change::Visible { cell, visible, .. } => self.visible[cell.idx as usize] = *visible,
        }
        self.current.push(change);
    }

    /// Inserts `child` into `parent`'s child list, clamping the index.
    fn link(&mut self, parent: u32, child: u32, index: usize) {
        let list = &mut self.children[parent as usize];
        let index = index.min(list.len());
        list.insert(index, child);
        self.parent[child as usize] = parent;
    }

    /// Removes `child` from its parent's child list.
    fn unlink(&mut self, child: u32) {
        let parent = self.parent[child as usize];
        let list = &mut self.children[parent as usize];
        if let Some(pos) = list.iter().position(|&c| c == child) {
            list.remove(pos);
        }
        self.parent[child as usize] = INVALID;
    }

    fn slot_index_in_parent(&self, idx: u32) -> Option<usize> {
        let parent = self.parent[idx as usize];
        if parent == INVALID {
            return None;
        }
        self.children[parent as usize]
            .iter()
            .position(|&c| c == idx)
    }

    pub(crate) fn slot_is_ancestor(&self, ancestor: u32, mut idx: u32) -> bool {
        while idx != INVALID {
            if idx == ancestor {
                return true;
            }
            idx = self.parent[idx as usize];
        }
        false
    }

    /// Rewires an edge end and keeps both terminals' edge lists in sync.
    fn set_terminal_raw(&mut self, edge: u32, terminal: u32, is_source: bool) {
        let e = edge as usize;
        let (previous, other) = if is_source {
            (self.source[e], self.target[e])
        } else {
            (self.target[e], self.source[e])
        };
        if previous == terminal {
            return;
        }
        // A loop edge stays listed while its other end still points here.
        if previous != INVALID && other != previous {
            self.edges[previous as usize].retain(|&x| x != edge);
        }
        if is_source {
            self.source[e] = terminal;
        } else {
            self.target[e] = terminal;
        }
        if terminal != INVALID && !self.edges[terminal as usize].contains(&edge) {
            self.edges[terminal as usize].push(edge);
        }
    }
}
