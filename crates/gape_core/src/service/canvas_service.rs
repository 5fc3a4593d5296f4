//! Canvas use-case service.
//!
//! # Responsibility
//! - Create, list and delete canvases (layout owners).
//! - Build load-time layout snapshots and read-only shared views.
//!
//! # Invariants
//! - Snapshots group active records by column and order them by position.
//! - Every snapshot has at least two columns.
//! - Shared views expose no mutation path.

use crate::canvas::store::LayoutStore;
use crate::model::block::Block;
use crate::model::layout::LayoutSnapshot;
use crate::repo::block_repo::BlockRepository;
use crate::repo::canvas_repo::{Canvas, CanvasRepository};
use crate::repo::error::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name given to canvases created without one.
pub const DEFAULT_CANVAS_NAME: &str = "Untitled canvas";

/// Service error for canvas use-cases.
#[derive(Debug)]
pub enum CanvasServiceError {
    /// User id is empty.
    InvalidUser,
    CanvasNotFound(String),
    Repo(RepoError),
}

impl Display for CanvasServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUser => write!(f, "user id must not be empty"),
            Self::CanvasNotFound(id) => write!(f, "canvas not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CanvasServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CanvasServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CanvasNotFound(id) => Self::CanvasNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Read-only rendering of a persisted canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasView {
    canvas: Canvas,
    snapshot: LayoutSnapshot,
}

impl CanvasView {
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn columns(&self) -> &[Vec<Block>] {
        &self.snapshot.columns
    }

    pub fn block_count(&self) -> usize {
        self.snapshot.columns.iter().map(Vec::len).sum()
    }
}

/// Use-case service over canvas and block repositories.
pub struct CanvasService<C: CanvasRepository, B: BlockRepository> {
    canvases: C,
    blocks: B,
}

impl<C: CanvasRepository, B: BlockRepository> CanvasService<C, B> {
    pub fn new(canvases: C, blocks: B) -> Self {
        Self { canvases, blocks }
    }

    /// Creates a canvas; a blank name falls back to [`DEFAULT_CANVAS_NAME`].
    pub fn create_canvas(&self, user_id: &str, name: &str) -> Result<Canvas, CanvasServiceError> {
        if user_id.trim().is_empty() {
            return Err(CanvasServiceError::InvalidUser);
        }
        let name = if name.trim().is_empty() {
            DEFAULT_CANVAS_NAME
        } else {
            name
        };
        let canvas = self.canvases.create_canvas(user_id.trim(), name)?;
        info!("event=canvas_create module=canvas status=ok");
        Ok(canvas)
    }

    pub fn list_canvases(&self, user_id: &str) -> Result<Vec<Canvas>, CanvasServiceError> {
        Ok(self.canvases.list_canvases(user_id.trim())?)
    }

    /// Deletes a canvas together with all of its blocks.
    pub fn delete_canvas(&self, canvas_id: &str) -> Result<(), CanvasServiceError> {
        self.canvases.delete_canvas(canvas_id)?;
        info!("event=canvas_delete module=canvas status=ok");
        Ok(())
    }

    /// Builds the load-time snapshot of a canvas.
    pub fn load_snapshot(&self, canvas_id: &str) -> Result<LayoutSnapshot, CanvasServiceError> {
        let records = self.blocks.list_active_blocks(canvas_id)?;
        let snapshot = LayoutSnapshot::from_records(records);
        info!(
            "event=canvas_load module=canvas status=ok columns={} blocks={}",
            snapshot.columns.len(),
            snapshot.columns.iter().map(Vec::len).sum::<usize>()
        );
        Ok(snapshot)
    }

    /// Loads a canvas into a fresh editing session.
    ///
    /// Empty columns are appended until `min_columns` exist; stored blocks
    /// keep their columns. A padded session already has `min_columns`
    /// columns, so `set_column_count(min_columns)` on it is a no-op; open at
    /// [`crate::model::layout::MIN_PRESENTED_COLUMNS`] before redistributing.
    pub fn open_session(
        &self,
        canvas_id: &str,
        min_columns: usize,
    ) -> Result<LayoutStore, CanvasServiceError> {
        let mut snapshot = self.load_snapshot(canvas_id)?;
        while snapshot.columns.len() < min_columns {
            snapshot.columns.push(Vec::new());
        }
        Ok(LayoutStore::from_snapshot(snapshot))
    }

    /// Read-only view for sharing a canvas.
    pub fn shared_view(&self, canvas_id: &str) -> Result<CanvasView, CanvasServiceError> {
        let canvas = self
            .canvases
            .get_canvas(canvas_id)?
            .ok_or_else(|| CanvasServiceError::CanvasNotFound(canvas_id.to_string()))?;
        let snapshot = self.load_snapshot(canvas_id)?;
        Ok(CanvasView { canvas, snapshot })
    }
}
