//! Block template catalogue entry.
//!
//! # Invariants
//! - Templates are read-only factory records; instantiation never mutates them.
//! - Each instantiation receives a deep copy of `data` and a fresh `BlockId`.

use crate::model::block::{Block, BlockData, BlockType};
use serde::{Deserialize, Serialize};

/// Read-only factory record used to instantiate new blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTemplate {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Default payload copied into every new instance.
    pub data: BlockData,
    /// Catalogue display order.
    pub order_index: i64,
    pub is_active: bool,
}

impl BlockTemplate {
    /// Builds a new block from this template.
    pub fn instantiate(&self) -> Block {
        Block::new(self.block_type, self.data.clone())
    }
}
