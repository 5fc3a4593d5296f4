//! Persistence reconciliation planning.
//!
//! # Responsibility
//! - Diff the flattened in-memory layout against the active persisted records.
//! - Produce the minimal delete/update/insert operation set.
//!
//! # Invariants
//! - `deletes` equals exactly `ids(persisted) - ids(current)`.
//! - Matching is by block id, never by position: a moved block is an update.
//! - A block whose `(column, order, type, data)` tuple is unchanged produces
//!   no operation.
//! - No id appears in more than one operation list.

use crate::model::block::BlockId;
use crate::model::layout::BlockPlacement;
use crate::model::record::PersistedBlock;
use std::collections::{HashMap, HashSet};

/// Operations needed to bring persisted state in line with a layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Persisted ids no longer present, in persisted order.
    pub deletes: Vec<BlockId>,
    /// Existing records whose placement or content changed.
    pub updates: Vec<BlockPlacement>,
    /// Blocks with no active persisted record.
    pub inserts: Vec<BlockPlacement>,
    /// Blocks already persisted exactly as they are.
    pub unchanged: usize,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.deletes.len() + self.updates.len() + self.inserts.len()
    }
}

/// Computes the reconciliation plan.
///
/// `placements` is the column-major flattening of the current layout and
/// `persisted` the active records stored for the same owner.
pub fn plan_reconciliation(placements: &[BlockPlacement], persisted: &[PersistedBlock]) -> SyncPlan {
    let current_ids: HashSet<&BlockId> = placements.iter().map(|p| &p.block_id).collect();
    let persisted_by_id: HashMap<&BlockId, &PersistedBlock> = persisted
        .iter()
        .filter(|record| record.is_active)
        .map(|record| (&record.id, record))
        .collect();

    let mut plan = SyncPlan::default();
    let mut seen_deletes = HashSet::new();
    for record in persisted.iter().filter(|record| record.is_active) {
        if !current_ids.contains(&record.id) && seen_deletes.insert(&record.id) {
            plan.deletes.push(record.id.clone());
        }
    }

    for placement in placements {
        match persisted_by_id.get(&placement.block_id) {
            Some(record) if is_unchanged(record, placement) => plan.unchanged += 1,
            Some(_) => plan.updates.push(placement.clone()),
            None => plan.inserts.push(placement.clone()),
        }
    }
    plan
}

fn is_unchanged(record: &PersistedBlock, placement: &BlockPlacement) -> bool {
    usize::try_from(record.column_index).ok() == Some(placement.column_index)
        && usize::try_from(record.order_index).ok() == Some(placement.order_index)
        && record.block_type == placement.block_type
        && record.data == placement.data
}
