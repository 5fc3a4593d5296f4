//! Persisted block record read model.

use crate::model::block::{Block, BlockData, BlockId, BlockType};

/// Block as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBlock {
    pub id: BlockId,
    pub block_type: BlockType,
    pub data: BlockData,
    /// Stored column membership.
    pub column_index: i64,
    /// Stored position within the column.
    pub order_index: i64,
    /// Soft-delete marker; inactive rows are excluded from layouts.
    pub is_active: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl PersistedBlock {
    /// Drops placement and bookkeeping fields.
    pub fn into_block(self) -> Block {
        Block::with_id(self.id, self.block_type, self.data)
    }
}
