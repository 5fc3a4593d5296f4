//! Multi-column block layout.
//!
//! # Responsibility
//! - Hold the canonical arrangement of blocks into ordered columns.
//! - Expose pure structural transitions; no I/O happens here.
//!
//! # Invariants
//! - Column count is always >= 1.
//! - Every block appears in exactly one column at exactly one position, and
//!   block ids are unique across the whole layout.
//! - Position within a column is insertion order; nothing is sorted implicitly.
//! - After `delete_block`, the column count is never below
//!   [`MIN_PRESENTED_COLUMNS`].
//!
//! Transitions return `true` only when the arrangement or content actually
//! changed. Operations on unknown ids or invalid targets are silent no-ops.

use crate::model::block::{Block, BlockData, BlockId, BlockType};
use crate::model::record::PersistedBlock;
use crate::model::template::BlockTemplate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Column floor kept by load and delete paths for the dual-column default.
pub const MIN_PRESENTED_COLUMNS: usize = 2;

/// Load-time boundary format: ordered columns of ordered blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub columns: Vec<Vec<Block>>,
}

impl LayoutSnapshot {
    /// Groups persisted records into columns.
    ///
    /// Inactive records are skipped. Columns follow ascending `column_index`
    /// and blocks follow ascending `order_index` (ties by id). Columns without
    /// blocks are dropped, then empty columns are appended until at least
    /// [`MIN_PRESENTED_COLUMNS`] exist.
    pub fn from_records(records: impl IntoIterator<Item = PersistedBlock>) -> Self {
        let mut grouped: BTreeMap<i64, Vec<PersistedBlock>> = BTreeMap::new();
        for record in records.into_iter().filter(|record| record.is_active) {
            grouped.entry(record.column_index).or_default().push(record);
        }

        let mut columns: Vec<Vec<Block>> = grouped
            .into_values()
            .map(|mut column| {
                column.sort_by(|left, right| {
                    left.order_index
                        .cmp(&right.order_index)
                        .then_with(|| left.id.cmp(&right.id))
                });
                column.into_iter().map(PersistedBlock::into_block).collect()
            })
            .collect();

        while columns.len() < MIN_PRESENTED_COLUMNS {
            columns.push(Vec::new());
        }
        Self { columns }
    }
}

/// One block flattened with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlacement {
    pub block_id: BlockId,
    pub block_type: BlockType,
    pub data: BlockData,
    pub column_index: usize,
    pub order_index: usize,
}

/// Ordered partition of blocks into columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    columns: Vec<Vec<BlockId>>,
    blocks: HashMap<BlockId, Block>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::empty()
    }
}

impl Layout {
    /// Empty-state default: two empty columns.
    pub fn empty() -> Self {
        Self::with_columns(MIN_PRESENTED_COLUMNS)
    }

    /// Creates `count` empty columns (at least one).
    pub fn with_columns(count: usize) -> Self {
        Self {
            columns: vec![Vec::new(); count.max(1)],
            blocks: HashMap::new(),
        }
    }

    /// Builds a layout from a snapshot.
    ///
    /// A snapshot without columns yields the empty-state default. A block id
    /// seen twice keeps its first position; later duplicates are dropped.
    pub fn from_snapshot(snapshot: LayoutSnapshot) -> Self {
        if snapshot.columns.is_empty() {
            return Self::empty();
        }

        let mut layout = Self {
            columns: Vec::with_capacity(snapshot.columns.len()),
            blocks: HashMap::new(),
        };
        for column in snapshot.columns {
            let mut ids = Vec::with_capacity(column.len());
            for block in column {
                if layout.blocks.contains_key(block.id()) {
                    continue;
                }
                ids.push(block.id().clone());
                layout.blocks.insert(block.id().clone(), block);
            }
            layout.columns.push(ids);
        }
        layout
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the id sequence of one column.
    pub fn column(&self, index: usize) -> Option<&[BlockId]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Returns all columns as id sequences.
    pub fn column_ids(&self) -> &[Vec<BlockId>] {
        &self.columns
    }

    /// Returns the blocks of one column in order.
    pub fn column_blocks(&self, index: usize) -> Vec<&Block> {
        self.columns
            .get(index)
            .map(|ids| ids.iter().filter_map(|id| self.blocks.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Returns `(column_index, position)` of a block.
    pub fn locate(&self, id: &BlockId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(column_index, ids)| {
            ids.iter()
                .position(|candidate| candidate == id)
                .map(|position| (column_index, position))
        })
    }

    /// Flattens the layout column-major, then by position.
    pub fn placements(&self) -> Vec<BlockPlacement> {
        let mut placements = Vec::with_capacity(self.blocks.len());
        for (column_index, ids) in self.columns.iter().enumerate() {
            for (order_index, id) in ids.iter().enumerate() {
                if let Some(block) = self.blocks.get(id) {
                    placements.push(BlockPlacement {
                        block_id: id.clone(),
                        block_type: block.block_type(),
                        data: block.data.clone(),
                        column_index,
                        order_index,
                    });
                }
            }
        }
        placements
    }

    /// Returns the set of block ids currently present.
    pub fn block_ids(&self) -> HashSet<BlockId> {
        self.blocks.keys().cloned().collect()
    }

    pub fn to_snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            columns: (0..self.columns.len())
                .map(|index| self.column_blocks(index).into_iter().cloned().collect())
                .collect(),
        }
    }

    /// Redistributes all blocks across `count` columns.
    ///
    /// Blocks are flattened column-major and cut into contiguous chunks of
    /// `ceil(total / count)`; the last non-empty chunk takes the remainder.
    /// `count == 0` and `count == column_count()` are no-ops.
    pub fn set_column_count(&mut self, count: usize) -> bool {
        if count == 0 || count == self.columns.len() {
            return false;
        }

        let flattened: Vec<BlockId> = self.columns.iter().flatten().cloned().collect();
        let chunk = flattened.len().div_ceil(count).max(1);
        let mut columns: Vec<Vec<BlockId>> = flattened
            .chunks(chunk)
            .map(<[BlockId]>::to_vec)
            .collect();
        columns.resize_with(count, Vec::new);

        if columns == self.columns {
            return false;
        }
        self.columns = columns;
        true
    }

    /// Moves a block to `(target_column, target_position)`.
    ///
    /// `target_position` is the final index inside the target column, counted
    /// after the block has been taken out of its source. `None` appends.
    /// Positions past the end are clamped to an append.
    pub fn move_block(
        &mut self,
        id: &BlockId,
        target_column: usize,
        target_position: Option<usize>,
    ) -> bool {
        if target_column >= self.columns.len() {
            return false;
        }
        let Some((source_column, source_position)) = self.locate(id) else {
            return false;
        };

        let target_len = if source_column == target_column {
            self.columns[target_column].len() - 1
        } else {
            self.columns[target_column].len()
        };
        let insert_at = target_position.unwrap_or(target_len).min(target_len);
        if source_column == target_column && insert_at == source_position {
            return false;
        }

        let moved = self.columns[source_column].remove(source_position);
        self.columns[target_column].insert(insert_at, moved);
        true
    }

    /// Instantiates a template into the shortest column.
    ///
    /// Ties go to the lowest column index. Returns the new block id.
    pub fn add_block(&mut self, template: &BlockTemplate) -> BlockId {
        let mut block = template.instantiate();
        while self.blocks.contains_key(block.id()) {
            block = Block::new(template.block_type, template.data.clone());
        }

        let target = self.shortest_column();
        let id = block.id().clone();
        self.columns[target].push(id.clone());
        self.blocks.insert(id.clone(), block);
        id
    }

    /// Replaces the payload of one block. Id and type are untouched.
    pub fn update_block_data(&mut self, id: &BlockId, data: BlockData) -> bool {
        let Some(block) = self.blocks.get_mut(id) else {
            return false;
        };
        if block.data == data {
            return false;
        }
        block.data = data;
        true
    }

    /// Removes a block.
    ///
    /// The column it leaves is pruned when it becomes empty; afterwards empty
    /// columns are appended until [`MIN_PRESENTED_COLUMNS`] exist.
    pub fn delete_block(&mut self, id: &BlockId) -> bool {
        let Some((column_index, position)) = self.locate(id) else {
            return false;
        };

        self.columns[column_index].remove(position);
        self.blocks.remove(id);
        if self.columns[column_index].is_empty() {
            self.columns.remove(column_index);
        }
        while self.columns.len() < MIN_PRESENTED_COLUMNS {
            self.columns.push(Vec::new());
        }
        true
    }

    fn shortest_column(&self) -> usize {
        self.columns
            .iter()
            .enumerate()
            .min_by_key(|(_, ids)| ids.len())
            .map_or(0, |(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, LayoutSnapshot, MIN_PRESENTED_COLUMNS};
    use crate::model::block::{Block, BlockData, BlockId, BlockType, FieldValue};
    use crate::model::record::PersistedBlock;
    use crate::model::template::BlockTemplate;

    fn block(id: &str) -> Block {
        Block::with_id(BlockId::from(id), BlockType::ProjectM, BlockData::new())
    }

    fn layout(columns: &[&[&str]]) -> Layout {
        Layout::from_snapshot(LayoutSnapshot {
            columns: columns
                .iter()
                .map(|ids| ids.iter().map(|id| block(id)).collect())
                .collect(),
        })
    }

    fn ids(layout: &Layout) -> Vec<Vec<String>> {
        layout
            .column_ids()
            .iter()
            .map(|column| column.iter().map(|id| id.to_string()).collect())
            .collect()
    }

    fn template() -> BlockTemplate {
        BlockTemplate {
            block_type: BlockType::ProfileM,
            data: BlockData::new(),
            order_index: 0,
            is_active: true,
        }
    }

    fn record(id: &str, column_index: i64, order_index: i64, is_active: bool) -> PersistedBlock {
        PersistedBlock {
            id: BlockId::from(id),
            block_type: BlockType::EducationL,
            data: BlockData::new(),
            column_index,
            order_index,
            is_active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn empty_layout_has_two_columns() {
        let layout = Layout::empty();
        assert_eq!(layout.column_count(), 2);
        assert!(layout.is_empty());
    }

    #[test]
    fn from_snapshot_drops_duplicate_ids() {
        let layout = layout(&[&["a", "b"], &["b", "c"]]);
        assert_eq!(ids(&layout), vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(layout.block_count(), 3);
    }

    #[test]
    fn add_block_fills_shortest_column_lowest_index_first() {
        let mut layout = Layout::empty();
        let first = layout.add_block(&template());
        let second = layout.add_block(&template());
        let third = layout.add_block(&template());

        assert_eq!(layout.column(0), Some(&[first, third][..]));
        assert_eq!(layout.column(1), Some(&[second][..]));
    }

    #[test]
    fn move_block_across_columns_inserts_at_position() {
        let mut layout = layout(&[&["b1", "b2"], &["b3"]]);
        assert!(layout.move_block(&BlockId::from("b2"), 1, Some(0)));
        assert_eq!(ids(&layout), vec![vec!["b1"], vec!["b2", "b3"]]);
    }

    #[test]
    fn move_block_to_own_slot_is_noop() {
        let mut layout = layout(&[&["a", "b", "c"], &[]]);
        assert!(!layout.move_block(&BlockId::from("b"), 0, Some(1)));
        assert!(!layout.move_block(&BlockId::from("c"), 0, None));
        assert!(!layout.move_block(&BlockId::from("c"), 0, Some(10)));
        assert_eq!(ids(&layout), vec![vec!["a", "b", "c"], vec![]]);
    }

    #[test]
    fn move_block_within_column_uses_final_index() {
        let mut layout = layout(&[&["a", "b", "c"], &[]]);
        assert!(layout.move_block(&BlockId::from("a"), 0, Some(2)));
        assert_eq!(ids(&layout), vec![vec!["b", "c", "a"], vec![]]);
    }

    #[test]
    fn move_block_rejects_unknown_id_and_column() {
        let mut layout = layout(&[&["a"], &["b"]]);
        assert!(!layout.move_block(&BlockId::from("zzz"), 0, None));
        assert!(!layout.move_block(&BlockId::from("a"), 2, None));
        assert_eq!(ids(&layout), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn move_round_trip_restores_layout() {
        let mut layout = layout(&[&["a", "b", "c"], &["d", "e"]]);
        let before = layout.clone();
        assert!(layout.move_block(&BlockId::from("b"), 1, Some(1)));
        assert!(layout.move_block(&BlockId::from("b"), 0, Some(1)));
        assert_eq!(layout, before);
    }

    #[test]
    fn set_column_count_chunks_by_ceiling() {
        let mut layout = layout(&[&["a", "b", "c"], &["d", "e"]]);
        assert!(layout.set_column_count(3));
        assert_eq!(ids(&layout), vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
    }

    #[test]
    fn set_column_count_is_idempotent() {
        let mut layout = layout(&[&["a", "b", "c"], &["d", "e"]]);
        assert!(layout.set_column_count(4));
        let once = layout.clone();
        assert!(!layout.set_column_count(4));
        assert_eq!(layout, once);
    }

    #[test]
    fn set_column_count_on_empty_layout_creates_empty_columns() {
        let mut layout = Layout::empty();
        assert!(layout.set_column_count(3));
        assert_eq!(ids(&layout), vec![Vec::<String>::new(); 3]);
        assert!(!layout.set_column_count(0));
        assert_eq!(layout.column_count(), 3);
    }

    #[test]
    fn update_block_data_replaces_payload_only_when_different() {
        let mut layout = layout(&[&["a"], &[]]);
        let mut data = BlockData::new();
        data.insert("role".to_string(), FieldValue::from("Lead"));

        assert!(layout.update_block_data(&BlockId::from("a"), data.clone()));
        assert!(!layout.update_block_data(&BlockId::from("a"), data.clone()));
        assert!(!layout.update_block_data(&BlockId::from("missing"), data));

        let updated = layout.block(&BlockId::from("a")).expect("block a exists");
        assert_eq!(updated.block_type(), BlockType::ProjectM);
        assert_eq!(
            updated.data.get("role").and_then(FieldValue::as_text),
            Some("Lead")
        );
    }

    #[test]
    fn delete_last_block_of_column_prunes_and_repads() {
        let mut layout = layout(&[&["a", "b"], &["c"]]);
        assert!(layout.delete_block(&BlockId::from("c")));
        assert_eq!(ids(&layout), vec![vec!["a", "b"], vec![]]);
    }

    #[test]
    fn delete_prunes_emptied_column_in_wide_layout() {
        let mut layout = layout(&[&["a"], &["b"], &["c"]]);
        assert!(layout.delete_block(&BlockId::from("b")));
        assert_eq!(ids(&layout), vec![vec!["a"], vec!["c"]]);
    }

    #[test]
    fn deleting_everything_keeps_column_floor() {
        let mut layout = layout(&[&["a"], &["b"]]);
        assert!(layout.delete_block(&BlockId::from("a")));
        assert!(layout.delete_block(&BlockId::from("b")));
        assert!(!layout.delete_block(&BlockId::from("b")));
        assert_eq!(layout.column_count(), MIN_PRESENTED_COLUMNS);
        assert!(layout.is_empty());
    }

    #[test]
    fn placements_are_column_major() {
        let layout = layout(&[&["a", "b"], &["c"]]);
        let placements: Vec<(String, usize, usize)> = layout
            .placements()
            .into_iter()
            .map(|p| (p.block_id.to_string(), p.column_index, p.order_index))
            .collect();
        assert_eq!(
            placements,
            vec![
                ("a".to_string(), 0, 0),
                ("b".to_string(), 0, 1),
                ("c".to_string(), 1, 0),
            ]
        );
    }

    #[test]
    fn snapshot_from_records_groups_orders_and_pads() {
        let snapshot = LayoutSnapshot::from_records(vec![
            record("late", 3, 1, true),
            record("early", 3, 0, true),
            record("gone", 1, 0, false),
        ]);
        assert_eq!(snapshot.columns.len(), 2);
        let first: Vec<&str> = snapshot.columns[0]
            .iter()
            .map(|block| block.id().as_str())
            .collect();
        assert_eq!(first, vec!["early", "late"]);
        assert!(snapshot.columns[1].is_empty());
    }

    #[test]
    fn to_snapshot_round_trips_arrangement() {
        let original = layout(&[&["a", "b"], &["c"], &[]]);
        let rebuilt = Layout::from_snapshot(original.to_snapshot());
        assert_eq!(rebuilt, original);
    }
}
