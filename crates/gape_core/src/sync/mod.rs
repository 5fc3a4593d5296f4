//! Layout persistence synchronization.
//!
//! # Responsibility
//! - Plan the minimal write set between a layout and stored records.
//! - Run saves against a `BlockRepository` with a single in-flight gate.
//!
//! # Invariants
//! - Planning is pure; only `SyncEngine::save` performs I/O.
//! - A failed save leaves the layout store dirty.

pub mod engine;
pub mod reconcile;
