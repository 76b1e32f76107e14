//! Graph core for the Jawbone annotation tool.
//! This crate is the single source of truth for graph invariants: node
//! lifecycle, paired relationships and node-shadowed entities.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, with_write_tx, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::entity::{
    Entity, EntityId, EntityType, Event, Location, NewEntity, NewEvent, NewLocation, NewPerson,
    NewTag, Person, Tag,
};
pub use model::node::{Node, NodeId, NodeType};
pub use model::note::{NewNote, Note, NoteId};
pub use model::page::Page;
pub use model::relationship::{EdgeLabels, Relationship, RelationshipId, RelationshipPair};
pub use model::validation::ValidationError;
pub use repo::error::{ConflictError, ErrorKind, ErrorPayload, RecordRef, RepoError, RepoResult};
pub use service::entity_service::EntityService;
pub use service::graph_service::{GraphService, GraphSnapshot, SnapshotNode};
pub use service::lifecycle_service::LifecycleService;
pub use service::link_service::LinkService;
pub use service::note_service::NoteService;
pub use service::page_service::{PageImportError, PageService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
