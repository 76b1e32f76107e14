//! Input validation failures shared by model constructors and services.

use crate::model::entity::EntityType;
use crate::model::node::{NodeId, NodeType};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Bad input shape or type. Always reported as `validation` to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Type tag outside `person|location|event|note|tag`.
    UnknownNodeType(String),
    /// Entity type tag outside `person|location|event|tag`.
    UnknownEntityType(String),
    /// Required text field is empty after trimming.
    BlankField {
        record: &'static str,
        field: &'static str,
    },
    /// Both ends of a relationship are the same node.
    SelfRelationship(NodeId),
    /// Merge sources do not share one node type.
    MixedNodeTypes { expected: NodeType, found: NodeType },
    /// Merge called without any source node.
    EmptyMerge,
    /// Merge target listed among its own sources.
    MergeIntoSelf(NodeId),
    /// Same source listed twice in one merge.
    DuplicateMergeSource(NodeId),
    /// Node was already superseded by another node.
    AlreadyMerged { node_id: NodeId, merged_into: NodeId },
    /// Merge target is soft-deleted.
    MergeIntoInactive(NodeId),
    /// Node type has no registered entity table.
    NoEntityVariant(NodeType),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNodeType(value) => write!(f, "`{value}` is not a valid node type"),
            Self::UnknownEntityType(value) => write!(f, "`{value}` is not a valid entity type"),
            Self::BlankField { record, field } => write!(f, "{record}.{field} is required"),
            Self::SelfRelationship(id) => {
                write!(f, "cannot relate node {id} to itself")
            }
            Self::MixedNodeTypes { expected, found } => write!(
                f,
                "cannot merge nodes of different types (`{expected}` and `{found}`)"
            ),
            Self::EmptyMerge => write!(f, "merge requires at least one source node"),
            Self::MergeIntoSelf(id) => write!(f, "node {id} cannot be merged into itself"),
            Self::DuplicateMergeSource(id) => {
                write!(f, "node {id} is listed more than once in merge")
            }
            Self::AlreadyMerged {
                node_id,
                merged_into,
            } => write!(f, "node {node_id} is already merged into {merged_into}"),
            Self::MergeIntoInactive(id) => {
                write!(f, "cannot merge into deleted node {id}")
            }
            Self::NoEntityVariant(node_type) => {
                write!(f, "node type `{node_type}` has no entity variant")
            }
        }
    }
}

impl Error for ValidationError {}

/// Returns the trimmed value, or a `BlankField` error when nothing is left.
pub(crate) fn require_text<'a>(
    value: &'a str,
    record: &'static str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField { record, field });
    }
    Ok(trimmed)
}

/// Entity variant for a node type, or `NoEntityVariant`.
pub(crate) fn entity_type_for(node_type: NodeType) -> Result<EntityType, ValidationError> {
    node_type
        .entity_type()
        .ok_or(ValidationError::NoEntityVariant(node_type))
}
