//! Block template catalogue persistence.
//!
//! # Invariants
//! - One template row per block type.
//! - Listing order is `order_index ASC`, ties broken by type name.

use crate::model::block::{BlockData, BlockType};
use crate::model::template::BlockTemplate;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::ready::{bool_to_int, ensure_connection_ready, int_to_bool};
use rusqlite::{params, Connection, Row};

/// Repository interface for the template catalogue.
pub trait TemplateRepository {
    /// Lists every template, active or not, in catalogue order.
    fn list_templates(&self) -> RepoResult<Vec<BlockTemplate>>;
    /// Creates or replaces the template of `template.block_type`.
    fn save_template(&self, template: &BlockTemplate) -> RepoResult<()>;
}

/// SQLite-backed template repository.
pub struct SqliteTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTemplateRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["block_templates"])?;
        Ok(Self { conn })
    }
}

impl TemplateRepository for SqliteTemplateRepository<'_> {
    fn list_templates(&self) -> RepoResult<Vec<BlockTemplate>> {
        let mut stmt = self.conn.prepare(
            "SELECT type, data, order_index, is_active
             FROM block_templates
             ORDER BY order_index ASC, type ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next()? {
            templates.push(parse_template_row(row)?);
        }
        Ok(templates)
    }

    fn save_template(&self, template: &BlockTemplate) -> RepoResult<()> {
        let data = serde_json::to_string(&template.data).map_err(RepoError::Encode)?;
        self.conn.execute(
            "INSERT INTO block_templates (type, data, order_index, is_active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(type) DO UPDATE SET
                data = excluded.data,
                order_index = excluded.order_index,
                is_active = excluded.is_active,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                template.block_type.as_str(),
                data,
                template.order_index,
                bool_to_int(template.is_active),
            ],
        )?;
        Ok(())
    }
}

fn parse_template_row(row: &Row<'_>) -> RepoResult<BlockTemplate> {
    let type_text: String = row.get("type")?;
    let block_type = BlockType::parse(&type_text)
        .ok_or_else(|| RepoError::InvalidData(format!("unknown template type `{type_text}`")))?;
    let data_text: String = row.get("data")?;
    let data: BlockData = serde_json::from_str(&data_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid data for template {type_text}: {err}"))
    })?;
    let is_active: i64 = row.get("is_active")?;

    Ok(BlockTemplate {
        block_type,
        data,
        order_index: row.get("order_index")?,
        is_active: int_to_bool(is_active, "block_templates.is_active")?,
    })
}
