//! Editing-session layout store.
//!
//! # Responsibility
//! - Own one canvas layout for one editing session.
//! - Track the lifecycle `Uninitialized -> Loaded -> Dirty <-> Saved`.
//!
//! # Invariants
//! - Only a mutation that actually changes the layout moves the store to `Dirty`.
//! - Mutations before the first `load` are no-ops.
//! - The dirty flag clears only through a successful save (`mark_saved`).

use crate::model::block::{BlockData, BlockId};
use crate::model::layout::{Layout, LayoutSnapshot};
use crate::model::template::BlockTemplate;
use log::debug;
use std::collections::HashSet;

/// Lifecycle state of a layout store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    /// No snapshot loaded yet.
    Uninitialized,
    /// Loaded and untouched since.
    Loaded,
    /// Holds mutations not yet synced.
    Dirty,
    /// Matches the last successful save.
    Saved,
}

/// Canonical layout plus lifecycle bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    layout: Layout,
    state: LayoutState,
    revision: u64,
    last_synced: Option<LayoutSnapshot>,
    known_ids: HashSet<BlockId>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStore {
    /// Creates an uninitialized store.
    pub fn new() -> Self {
        Self {
            layout: Layout::empty(),
            state: LayoutState::Uninitialized,
            revision: 0,
            last_synced: None,
            known_ids: HashSet::new(),
        }
    }

    /// Creates a store already loaded from `snapshot`.
    pub fn from_snapshot(snapshot: LayoutSnapshot) -> Self {
        let mut store = Self::new();
        store.load(snapshot);
        store
    }

    /// Replaces the layout with `snapshot` and discards unsaved mutations.
    pub fn load(&mut self, snapshot: LayoutSnapshot) {
        self.layout = Layout::from_snapshot(snapshot);
        self.state = LayoutState::Loaded;
        self.revision += 1;
        self.known_ids = self.layout.block_ids();
        self.last_synced = Some(self.layout.to_snapshot());
        debug!(
            "event=layout_load module=layout status=ok columns={} blocks={}",
            self.layout.column_count(),
            self.layout.block_count()
        );
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state != LayoutState::Uninitialized
    }

    pub fn is_dirty(&self) -> bool {
        self.state == LayoutState::Dirty
    }

    /// Signal for unsaved-changes guards before navigating away.
    pub fn has_unsaved_changes(&self) -> bool {
        self.is_dirty()
    }

    /// Monotonic counter bumped on every applied change; lets observers diff cheaply.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Arrangement recorded by the last load or successful save.
    pub fn last_synced(&self) -> Option<&LayoutSnapshot> {
        self.last_synced.as_ref()
    }

    /// Ids this session has loaded or saved.
    pub fn known_ids(&self) -> &HashSet<BlockId> {
        &self.known_ids
    }

    pub fn set_column_count(&mut self, count: usize) -> bool {
        self.apply("set_column_count", |layout| layout.set_column_count(count))
    }

    pub fn move_block(
        &mut self,
        block_id: &BlockId,
        target_column: usize,
        target_position: Option<usize>,
    ) -> bool {
        self.apply("move_block", |layout| {
            layout.move_block(block_id, target_column, target_position)
        })
    }

    /// Adds a block built from `template`; `None` when the store is not loaded.
    pub fn add_block(&mut self, template: &BlockTemplate) -> Option<BlockId> {
        let mut created = None;
        self.apply("add_block", |layout| {
            created = Some(layout.add_block(template));
            true
        });
        created
    }

    pub fn update_block_data(&mut self, block_id: &BlockId, data: BlockData) -> bool {
        self.apply("update_block_data", |layout| {
            layout.update_block_data(block_id, data)
        })
    }

    pub fn delete_block(&mut self, block_id: &BlockId) -> bool {
        self.apply("delete_block", |layout| layout.delete_block(block_id))
    }

    /// Records a successful save of `snapshot` and clears the dirty flag.
    pub(crate) fn mark_saved(&mut self, snapshot: LayoutSnapshot) {
        self.known_ids.extend(
            snapshot
                .columns
                .iter()
                .flatten()
                .map(|block| block.id().clone()),
        );
        self.last_synced = Some(snapshot);
        self.state = LayoutState::Saved;
    }

    fn apply(&mut self, op: &str, mutate: impl FnOnce(&mut Layout) -> bool) -> bool {
        if self.state == LayoutState::Uninitialized {
            debug!("event=layout_mutation module=layout op={op} status=noop reason=uninitialized");
            return false;
        }

        let changed = mutate(&mut self.layout);
        if changed {
            self.state = LayoutState::Dirty;
            self.revision += 1;
            debug!(
                "event=layout_mutation module=layout op={op} status=ok columns={} blocks={}",
                self.layout.column_count(),
                self.layout.block_count()
            );
        } else {
            debug!("event=layout_mutation module=layout op={op} status=noop");
        }
        changed
    }
}
