//! Canvas (layout owner) persistence.
//!
//! # Invariants
//! - Canvas ids are UUIDv4 strings assigned at creation.
//! - Deleting a canvas hard-deletes it; its block rows cascade.

use crate::repo::error::{RepoError, RepoResult};
use crate::repo::ready::ensure_connection_ready;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// One owned canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// Repository interface for canvases.
pub trait CanvasRepository {
    fn create_canvas(&self, user_id: &str, name: &str) -> RepoResult<Canvas>;
    fn get_canvas(&self, canvas_id: &str) -> RepoResult<Option<Canvas>>;
    /// Lists a user's canvases, oldest first.
    fn list_canvases(&self, user_id: &str) -> RepoResult<Vec<Canvas>>;
    fn delete_canvas(&self, canvas_id: &str) -> RepoResult<()>;
}

/// SQLite-backed canvas repository.
pub struct SqliteCanvasRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCanvasRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["canvases", "gape_blocks"])?;
        Ok(Self { conn })
    }
}

impl CanvasRepository for SqliteCanvasRepository<'_> {
    fn create_canvas(&self, user_id: &str, name: &str) -> RepoResult<Canvas> {
        if user_id.trim().is_empty() {
            return Err(RepoError::InvalidData("canvas user id must not be empty".to_string()));
        }
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO canvases (id, user_id, name) VALUES (?1, ?2, ?3);",
            params![id, user_id, name.trim()],
        )?;

        self.get_canvas(&id)?
            .ok_or(RepoError::CanvasNotFound(id))
    }

    fn get_canvas(&self, canvas_id: &str) -> RepoResult<Option<Canvas>> {
        let canvas = self
            .conn
            .query_row(
                "SELECT id, user_id, name, created_at
                 FROM canvases
                 WHERE id = ?1;",
                [canvas_id],
                parse_canvas_row,
            )
            .optional()?;
        Ok(canvas)
    }

    fn list_canvases(&self, user_id: &str) -> RepoResult<Vec<Canvas>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, created_at
             FROM canvases
             WHERE user_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let canvases = stmt
            .query_map([user_id], parse_canvas_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(canvases)
    }

    fn delete_canvas(&self, canvas_id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM canvases WHERE id = ?1;", [canvas_id])?;
        if changed == 0 {
            return Err(RepoError::CanvasNotFound(canvas_id.to_string()));
        }
        Ok(())
    }
}

fn parse_canvas_row(row: &Row<'_>) -> rusqlite::Result<Canvas> {
    Ok(Canvas {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
