//! Domain model for canvas layouts.
//!
//! # Responsibility
//! - Define blocks, templates and the column layout value type.
//! - Keep every structural transition pure and I/O free.
//!
//! # Invariants
//! - Every block is identified by a stable, never reused `BlockId`.
//! - A layout owns arrangement; block content is stored once per id.

pub mod block;
pub mod layout;
pub mod record;
pub mod schema;
pub mod template;
