//! Drag gesture resolution.
//!
//! # Responsibility
//! - Track one pending drag gesture per canvas.
//! - Resolve a drop into at most one `LayoutStore::move_block` call.
//!
//! # Invariants
//! - A drop on a column appends to that column.
//! - A drop on a sibling block uses the index reported by the rendering
//!   layer, captured before the dragged block is removed. The index is never
//!   recomputed from storage order.
//! - Drops without a target, on unknown targets, or after cancellation leave
//!   the layout untouched.

use crate::canvas::store::LayoutStore;
use crate::model::block::BlockId;
use crate::model::layout::Layout;
use log::debug;

/// Prefix of drop target ids that name a column instead of a block.
pub const COLUMN_TARGET_PREFIX: &str = "column-";

/// Returns the drop target id of a column.
pub fn column_target_id(column_index: usize) -> String {
    format!("{COLUMN_TARGET_PREFIX}{column_index}")
}

/// Where a dragged block was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Released over a column body.
    Column(usize),
    /// Released over a sibling block. `index` is the sibling's rendered
    /// position inside its column.
    Block { block_id: BlockId, index: usize },
}

impl DropTarget {
    /// Interprets a raw drop target id.
    ///
    /// Ids shaped like `column-<n>` name a column. Any other id names a block
    /// and requires the reported `sibling_index`; without it the drop is
    /// unresolvable and `None` is returned.
    pub fn parse(drop_target_id: &str, sibling_index: Option<usize>) -> Option<Self> {
        if let Some(index) = drop_target_id
            .strip_prefix(COLUMN_TARGET_PREFIX)
            .and_then(|rest| rest.parse::<usize>().ok())
        {
            return Some(Self::Column(index));
        }
        if drop_target_id.is_empty() {
            return None;
        }
        sibling_index.map(|index| Self::Block {
            block_id: BlockId::from(drop_target_id),
            index,
        })
    }
}

/// Pending gesture state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { source: BlockId },
}

/// Result of finishing a gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// The block moved.
    Moved {
        block_id: BlockId,
        column_index: usize,
        position: Option<usize>,
    },
    /// A target resolved but the move was a null move.
    Unchanged,
    /// No gesture, no target, or an unresolvable target.
    Discarded,
}

/// Translates drag gestures into layout moves.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Block currently being dragged.
    pub fn active_block(&self) -> Option<&BlockId> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { source } => Some(source),
        }
    }

    /// Starts a gesture, replacing any pending one.
    pub fn begin(&mut self, source: BlockId) {
        debug!("event=drag_start module=drag status=ok");
        self.state = DragState::Dragging { source };
    }

    /// Aborts the pending gesture. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = matches!(self.state, DragState::Dragging { .. });
        self.state = DragState::Idle;
        debug!("event=drag_cancel module=drag status=ok pending={was_dragging}");
        was_dragging
    }

    /// Finishes the pending gesture over `target` and applies the move.
    pub fn drop(&mut self, store: &mut LayoutStore, target: Option<DropTarget>) -> DragOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging { source } = state else {
            debug!("event=drag_end module=drag status=noop reason=idle");
            return DragOutcome::Discarded;
        };
        let Some(target) = target else {
            debug!("event=drag_end module=drag status=noop reason=no_target");
            return DragOutcome::Discarded;
        };
        let Some((column_index, position)) = resolve_drop(store.layout(), &source, &target)
        else {
            debug!("event=drag_end module=drag status=noop reason=unresolved_target");
            return DragOutcome::Discarded;
        };

        if store.move_block(&source, column_index, position) {
            debug!("event=drag_end module=drag status=ok column={column_index}");
            DragOutcome::Moved {
                block_id: source,
                column_index,
                position,
            }
        } else {
            debug!("event=drag_end module=drag status=noop reason=null_move");
            DragOutcome::Unchanged
        }
    }
}

/// Resolves a drop into `(target_column, target_position)`.
///
/// Returns `None` when the source is unknown, the target column does not
/// exist, the sibling is unknown, or the sibling is the source itself.
pub fn resolve_drop(
    layout: &Layout,
    source: &BlockId,
    target: &DropTarget,
) -> Option<(usize, Option<usize>)> {
    if !layout.contains(source) {
        return None;
    }
    match target {
        DropTarget::Column(index) => (*index < layout.column_count()).then_some((*index, None)),
        DropTarget::Block { block_id, index } => {
            if block_id == source {
                return None;
            }
            let (column_index, _) = layout.locate(block_id)?;
            Some((column_index, Some(*index)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{column_target_id, resolve_drop, DragController, DragOutcome, DropTarget};
    use crate::canvas::store::{LayoutState, LayoutStore};
    use crate::model::block::{Block, BlockData, BlockId, BlockType};
    use crate::model::layout::LayoutSnapshot;

    fn store(columns: &[&[&str]]) -> LayoutStore {
        LayoutStore::from_snapshot(LayoutSnapshot {
            columns: columns
                .iter()
                .map(|ids| {
                    ids.iter()
                        .map(|id| {
                            Block::with_id(BlockId::from(*id), BlockType::ExperienceM, BlockData::new())
                        })
                        .collect()
                })
                .collect(),
        })
    }

    fn ids(store: &LayoutStore) -> Vec<Vec<String>> {
        store
            .layout()
            .column_ids()
            .iter()
            .map(|column| column.iter().map(|id| id.to_string()).collect())
            .collect()
    }

    #[test]
    fn parse_distinguishes_columns_and_blocks() {
        assert_eq!(
            DropTarget::parse(&column_target_id(2), None),
            Some(DropTarget::Column(2))
        );
        assert_eq!(
            DropTarget::parse("b7", Some(1)),
            Some(DropTarget::Block {
                block_id: BlockId::from("b7"),
                index: 1
            })
        );
        assert_eq!(DropTarget::parse("b7", None), None);
        assert_eq!(DropTarget::parse("", Some(0)), None);
    }

    #[test]
    fn drop_on_column_appends() {
        let mut store = store(&[&["a", "b"], &["c"]]);
        let mut drag = DragController::new();
        drag.begin(BlockId::from("a"));

        let outcome = drag.drop(&mut store, Some(DropTarget::Column(1)));
        assert!(matches!(outcome, DragOutcome::Moved { column_index: 1, position: None, .. }));
        assert_eq!(ids(&store), vec![vec!["b"], vec!["c", "a"]]);
        assert!(drag.active_block().is_none());
    }

    #[test]
    fn drop_on_sibling_in_other_column_inserts_before_it() {
        let mut store = store(&[&["a", "b"], &["c", "d"]]);
        let mut drag = DragController::new();
        drag.begin(BlockId::from("a"));

        drag.drop(
            &mut store,
            Some(DropTarget::Block {
                block_id: BlockId::from("d"),
                index: 1,
            }),
        );
        assert_eq!(ids(&store), vec![vec!["b"], vec!["c", "a", "d"]]);
    }

    #[test]
    fn drop_on_sibling_in_same_column_uses_reported_index() {
        let mut store = store(&[&["a", "b", "c"], &[]]);
        let mut drag = DragController::new();

        drag.begin(BlockId::from("a"));
        drag.drop(
            &mut store,
            Some(DropTarget::Block {
                block_id: BlockId::from("c"),
                index: 2,
            }),
        );
        assert_eq!(ids(&store), vec![vec!["b", "c", "a"], vec![]]);

        drag.begin(BlockId::from("a"));
        drag.drop(
            &mut store,
            Some(DropTarget::Block {
                block_id: BlockId::from("b"),
                index: 0,
            }),
        );
        assert_eq!(ids(&store), vec![vec!["a", "b", "c"], vec![]]);
    }

    #[test]
    fn drop_on_sibling_trusts_reported_index_over_stored_order() {
        let mut store = store(&[&["a", "b", "c", "d"], &[]]);
        let mut drag = DragController::new();

        drag.begin(BlockId::from("a"));
        let outcome = drag.drop(
            &mut store,
            Some(DropTarget::Block {
                block_id: BlockId::from("c"),
                index: 0,
            }),
        );
        assert_eq!(outcome, DragOutcome::Unchanged);
        assert_eq!(ids(&store), vec![vec!["a", "b", "c", "d"], vec![]]);
        assert!(!store.is_dirty());

        drag.begin(BlockId::from("d"));
        drag.drop(
            &mut store,
            Some(DropTarget::Block {
                block_id: BlockId::from("b"),
                index: 0,
            }),
        );
        assert_eq!(ids(&store), vec![vec!["d", "a", "b", "c"], vec![]]);
    }

    #[test]
    fn drop_without_target_is_discarded_and_clean() {
        let mut store = store(&[&["a"], &["b"]]);
        let mut drag = DragController::new();
        drag.begin(BlockId::from("a"));

        assert_eq!(drag.drop(&mut store, None), DragOutcome::Discarded);
        assert_eq!(store.state(), LayoutState::Loaded);
    }

    #[test]
    fn cancel_discards_pending_gesture() {
        let mut store = store(&[&["a"], &["b"]]);
        let mut drag = DragController::new();
        drag.begin(BlockId::from("a"));
        assert!(drag.cancel());
        assert!(!drag.cancel());

        assert_eq!(
            drag.drop(&mut store, Some(DropTarget::Column(1))),
            DragOutcome::Discarded
        );
        assert_eq!(ids(&store), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn drop_on_self_or_own_slot_does_not_dirty() {
        let mut store = store(&[&["a", "b"], &[]]);
        let mut drag = DragController::new();

        drag.begin(BlockId::from("a"));
        let outcome = drag.drop(
            &mut store,
            Some(DropTarget::Block {
                block_id: BlockId::from("a"),
                index: 0,
            }),
        );
        assert_eq!(outcome, DragOutcome::Discarded);

        drag.begin(BlockId::from("b"));
        assert_eq!(
            drag.drop(&mut store, Some(DropTarget::Column(0))),
            DragOutcome::Unchanged
        );
        assert!(!store.is_dirty());
    }

    #[test]
    fn resolve_rejects_unknown_targets() {
        let store = store(&[&["a"], &[]]);
        let source = BlockId::from("a");
        assert_eq!(resolve_drop(store.layout(), &source, &DropTarget::Column(5)), None);
        assert_eq!(
            resolve_drop(
                store.layout(),
                &source,
                &DropTarget::Block {
                    block_id: BlockId::from("ghost"),
                    index: 0
                }
            ),
            None
        );
        assert_eq!(
            resolve_drop(store.layout(), &BlockId::from("ghost"), &DropTarget::Column(0)),
            None
        );
    }
}
