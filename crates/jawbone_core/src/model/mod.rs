//! Graph domain model shared by repositories and services.
//!
//! # Responsibility
//! - Define the node/relationship identity graph records.
//! - Define the closed set of entity variants that shadow nodes.
//! - Define page/note records for the annotation side of the tool.
//!
//! # Invariants
//! - Every entity carries the id of exactly one shadow node.
//! - Every logical edge is represented by a reverse-labeled pair.
//! - Soft delete is a flag, never a row removal.

pub mod entity;
pub mod node;
pub mod note;
pub mod page;
pub mod relationship;
pub mod validation;
