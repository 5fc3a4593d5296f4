//! In-memory editing session for one canvas.
//!
//! # Responsibility
//! - Hold the session-owned layout store and its lifecycle state.
//! - Resolve drag gestures into layout moves.
//!
//! # Invariants
//! - Everything here is synchronous and performs no I/O.
//! - One store is owned by exactly one editing session; no locking.

pub mod drag;
pub mod store;
