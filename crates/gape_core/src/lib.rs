//! Column layout engine for block-based page canvases.
//! Layout transitions, drag resolution and persistence reconciliation live here;
//! front ends only render and forward gestures.

pub mod canvas;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use canvas::drag::{DragController, DragOutcome, DropTarget};
pub use canvas::store::{LayoutState, LayoutStore};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::block::{Block, BlockData, BlockId, BlockType, FieldValue};
pub use model::layout::{Layout, LayoutSnapshot, MIN_PRESENTED_COLUMNS};
pub use model::schema::{validate_block_data, BlockValidationError};
pub use model::template::BlockTemplate;
pub use repo::block_repo::{BlockRepository, SqliteBlockRepository};
pub use repo::canvas_repo::{Canvas, CanvasRepository, SqliteCanvasRepository};
pub use repo::template_repo::{SqliteTemplateRepository, TemplateRepository};
pub use repo::{RepoError, RepoResult};
pub use service::canvas_service::{CanvasService, CanvasServiceError, CanvasView};
pub use service::template_service::{TemplateCatalog, TemplateLoadError, TemplateService};
pub use sync::engine::{SaveError, SaveReport, SyncEngine};
pub use sync::reconcile::{plan_reconciliation, SyncPlan};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
