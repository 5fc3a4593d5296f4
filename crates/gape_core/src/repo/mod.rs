//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the persistence contracts the sync engine and services depend on.
//! - Keep SQL details out of layout and reconciliation logic.
//!
//! # Invariants
//! - Repositories refuse connections whose migrations have not run.
//! - Block rows are soft-deleted; canvases are hard-deleted with cascade.

pub mod block_repo;
pub mod canvas_repo;
pub mod error;
mod ready;
pub mod template_repo;

pub use error::{RepoError, RepoResult};
