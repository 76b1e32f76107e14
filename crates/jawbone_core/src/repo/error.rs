//! Error taxonomy shared by repositories and services.
//!
//! # Invariants
//! - Every failure maps to exactly one machine-readable [`ErrorKind`].
//! - Lower layers propagate errors unchanged; nothing is swallowed.

use crate::db::DbError;
use crate::model::entity::{EntityId, EntityType};
use crate::model::node::NodeId;
use crate::model::note::NoteId;
use crate::model::relationship::RelationshipId;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identifies the record a `NotFound` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    Node(NodeId),
    Relationship(RelationshipId),
    /// Reverse leg of the given relationship is missing (corrupted pairing).
    PartnerOf(RelationshipId),
    Entity {
        entity_type: EntityType,
        id: EntityId,
    },
    /// No entity row exists for an entity-bearing node.
    EntityForNode(NodeId),
    Note(NoteId),
    /// No note owns this `note` node.
    NoteForNode(NodeId),
    Page(i64),
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node {id}"),
            Self::Relationship(id) => write!(f, "relationship {id}"),
            Self::PartnerOf(id) => write!(f, "partner of relationship {id}"),
            Self::Entity { entity_type, id } => write!(f, "{entity_type} {id}"),
            Self::EntityForNode(id) => write!(f, "entity for node {id}"),
            Self::Note(id) => write!(f, "note {id}"),
            Self::NoteForNode(id) => write!(f, "note for node {id}"),
            Self::Page(number) => write!(f, "page {number}"),
        }
    }
}

/// Uniqueness or referential conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// An edge for the ordered pair already exists (deleted or not).
    DuplicateEdge { start: NodeId, end: NodeId },
    /// An active tag already uses this name, ignoring case.
    DuplicateTagName(String),
    /// Hard delete refused while other rows still reference the node.
    NodeInUse {
        node_id: NodeId,
        referenced_by: &'static str,
    },
}

impl Display for ConflictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEdge { start, end } => write!(
                f,
                "a relationship between nodes {start} and {end} already exists"
            ),
            Self::DuplicateTagName(name) => write!(f, "a tag named `{name}` already exists"),
            Self::NodeInUse {
                node_id,
                referenced_by,
            } => write!(f, "node {node_id} is still referenced by {referenced_by}"),
        }
    }
}

/// Error for every graph, entity, note and page operation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound(RecordRef),
    Conflict(ConflictError),
    Db(DbError),
    /// Persisted row cannot be decoded into a valid record.
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Storage,
        }
    }

    /// Structured failure for the request layer.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(record) => write!(f, "{record} not found"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConflictError> for RepoError {
    fn from(value: ConflictError) -> Self {
        Self::Conflict(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }

    /// Status code the HTTP layer is expected to use.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::Conflict => 400,
            Self::NotFound => 404,
            Self::Storage => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::{ConflictError, ErrorKind, RecordRef, RepoError};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn kinds_follow_taxonomy() {
        let id = Uuid::new_v4();
        assert_eq!(
            RepoError::from(ValidationError::EmptyMerge).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RepoError::NotFound(RecordRef::Node(id)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RepoError::from(ConflictError::DuplicateTagName("foo".to_string())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
    }

    #[test]
    fn payload_carries_kind_and_message() {
        let id = Uuid::new_v4();
        let payload = RepoError::NotFound(RecordRef::PartnerOf(id)).to_payload();
        assert_eq!(payload.kind.as_str(), "not_found");
        assert_eq!(
            payload.message,
            format!("partner of relationship {id} not found")
        );
    }
}
