//! Use-case services above repositories.
//!
//! # Responsibility
//! - Compose repository calls into canvas and catalogue use cases.
//! - Map persistence errors to service-level errors.

pub mod canvas_service;
pub mod template_service;
