//! Block persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store block records keyed by owning canvas.
//! - Apply reconciliation plans produced by `sync::reconcile`.
//!
//! # Invariants
//! - Reads only return `is_active=1` rows of the requested canvas.
//! - Delete is a soft delete and succeeds for unknown or already deleted ids.
//! - Insert revives a soft-deleted row with the same id of the same canvas;
//!   an id owned by a different canvas is rejected with `IdConflict`.
//! - `SqliteBlockRepository::apply_plan` commits all operations or none.

use crate::model::block::{BlockData, BlockId, BlockType};
use crate::model::layout::BlockPlacement;
use crate::model::record::PersistedBlock;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::ready::{ensure_connection_ready, int_to_bool};
use crate::sync::reconcile::SyncPlan;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for block records of one owner (canvas).
pub trait BlockRepository {
    /// Lists active blocks ordered by column, then order index, then id.
    fn list_active_blocks(&self, owner_id: &str) -> RepoResult<Vec<PersistedBlock>>;
    /// Inserts one block, reviving a soft-deleted record with the same id.
    fn insert_block(&self, owner_id: &str, placement: &BlockPlacement) -> RepoResult<()>;
    /// Rewrites placement, type and payload of one active block.
    fn update_block(&self, owner_id: &str, placement: &BlockPlacement) -> RepoResult<()>;
    /// Soft-deletes one block.
    fn delete_block(&self, owner_id: &str, block_id: &BlockId) -> RepoResult<()>;

    /// Applies deletes, then updates, then inserts, stopping at the first error.
    ///
    /// Implementations with transactions should override this so a failure
    /// leaves nothing applied.
    fn apply_plan(&self, owner_id: &str, plan: &SyncPlan) -> RepoResult<()> {
        for block_id in &plan.deletes {
            self.delete_block(owner_id, block_id)?;
        }
        for placement in &plan.updates {
            self.update_block(owner_id, placement)?;
        }
        for placement in &plan.inserts {
            self.insert_block(owner_id, placement)?;
        }
        Ok(())
    }
}

/// SQLite-backed block repository.
pub struct SqliteBlockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlockRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["canvases", "gape_blocks"])?;
        Ok(Self { conn })
    }
}

impl BlockRepository for SqliteBlockRepository<'_> {
    fn list_active_blocks(&self, owner_id: &str) -> RepoResult<Vec<PersistedBlock>> {
        ensure_canvas_exists(self.conn, owner_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                type,
                data,
                column_number,
                order_index,
                is_active,
                created_at,
                updated_at
             FROM gape_blocks
             WHERE canvas_id = ?1
               AND is_active = 1
             ORDER BY column_number ASC, order_index ASC, id ASC;",
        )?;

        let mut rows = stmt.query([owner_id])?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            blocks.push(parse_block_row(row)?);
        }
        Ok(blocks)
    }

    fn insert_block(&self, owner_id: &str, placement: &BlockPlacement) -> RepoResult<()> {
        ensure_canvas_exists(self.conn, owner_id)?;
        insert_block_row(self.conn, owner_id, placement)
    }

    fn update_block(&self, owner_id: &str, placement: &BlockPlacement) -> RepoResult<()> {
        update_block_row(self.conn, owner_id, placement)
    }

    fn delete_block(&self, owner_id: &str, block_id: &BlockId) -> RepoResult<()> {
        soft_delete_block_row(self.conn, owner_id, block_id)
    }

    fn apply_plan(&self, owner_id: &str, plan: &SyncPlan) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_canvas_exists(&tx, owner_id)?;

        for block_id in &plan.deletes {
            soft_delete_block_row(&tx, owner_id, block_id)?;
        }
        for placement in &plan.updates {
            update_block_row(&tx, owner_id, placement)?;
        }
        for placement in &plan.inserts {
            insert_block_row(&tx, owner_id, placement)?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn ensure_canvas_exists(conn: &Connection, owner_id: &str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM canvases WHERE id = ?1);",
        [owner_id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::CanvasNotFound(owner_id.to_string()))
    }
}

fn insert_block_row(conn: &Connection, owner_id: &str, placement: &BlockPlacement) -> RepoResult<()> {
    let data = encode_data(&placement.data)?;
    let changed = conn.execute(
        "INSERT INTO gape_blocks (
            id,
            canvas_id,
            type,
            data,
            column_number,
            order_index,
            is_active
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
         ON CONFLICT(id) DO UPDATE SET
            type = excluded.type,
            data = excluded.data,
            column_number = excluded.column_number,
            order_index = excluded.order_index,
            is_active = 1,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE gape_blocks.canvas_id = excluded.canvas_id;",
        params![
            placement.block_id.as_str(),
            owner_id,
            placement.block_type.as_str(),
            data,
            to_sql_index(placement.column_index, "column_number")?,
            to_sql_index(placement.order_index, "order_index")?,
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::IdConflict(placement.block_id.clone()));
    }
    Ok(())
}

fn update_block_row(conn: &Connection, owner_id: &str, placement: &BlockPlacement) -> RepoResult<()> {
    let data = encode_data(&placement.data)?;
    let changed = conn.execute(
        "UPDATE gape_blocks
         SET
            type = ?3,
            data = ?4,
            column_number = ?5,
            order_index = ?6,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND canvas_id = ?2
           AND is_active = 1;",
        params![
            placement.block_id.as_str(),
            owner_id,
            placement.block_type.as_str(),
            data,
            to_sql_index(placement.column_index, "column_number")?,
            to_sql_index(placement.order_index, "order_index")?,
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::BlockNotFound(placement.block_id.clone()));
    }
    Ok(())
}

fn soft_delete_block_row(conn: &Connection, owner_id: &str, block_id: &BlockId) -> RepoResult<()> {
    conn.execute(
        "UPDATE gape_blocks
         SET
            is_active = 0,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND canvas_id = ?2
           AND is_active = 1;",
        params![block_id.as_str(), owner_id],
    )?;
    Ok(())
}

fn parse_block_row(row: &Row<'_>) -> RepoResult<PersistedBlock> {
    let id: String = row.get("id")?;
    let type_text: String = row.get("type")?;
    let block_type = BlockType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("unknown block type `{type_text}` for block {id}"))
    })?;
    let data_text: String = row.get("data")?;
    let data: BlockData = serde_json::from_str(&data_text)
        .map_err(|err| RepoError::InvalidData(format!("invalid data for block {id}: {err}")))?;
    let is_active: i64 = row.get("is_active")?;

    Ok(PersistedBlock {
        id: BlockId::new(id),
        block_type,
        data,
        column_index: row.get("column_number")?,
        order_index: row.get("order_index")?,
        is_active: int_to_bool(is_active, "gape_blocks.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn encode_data(data: &BlockData) -> RepoResult<String> {
    serde_json::to_string(data).map_err(RepoError::Encode)
}

fn to_sql_index(value: usize, column: &str) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("{column} out of range: {value}")))
}
