//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own transaction scope: every write operation is one unit of work.
//! - Keep request-layer callers decoupled from storage details.

pub mod entity_service;
pub mod graph_service;
pub mod lifecycle_service;
pub mod link_service;
pub mod note_service;
pub mod page_service;
