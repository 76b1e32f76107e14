//! Node model: the identity/lifecycle shadow of every graph entity.
//!
//! # Invariants
//! - A node carries type and lifecycle metadata only, never domain content.
//! - `merged` points at the node that superseded this one.
//! - Active means neither deleted nor merged.

use crate::model::entity::EntityType;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a node.
pub type NodeId = Uuid;

/// Permitted node type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Person,
    Location,
    Event,
    Note,
    Tag,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Person,
        NodeType::Location,
        NodeType::Event,
        NodeType::Note,
        NodeType::Tag,
    ];

    /// Storage/wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Location => "location",
            Self::Event => "event",
            Self::Note => "note",
            Self::Tag => "tag",
        }
    }

    /// Parses an exact storage tag.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "person" => Some(Self::Person),
            "location" => Some(Self::Location),
            "event" => Some(Self::Event),
            "note" => Some(Self::Note),
            "tag" => Some(Self::Tag),
            _ => None,
        }
    }

    /// Entity table backing this node type, if any. `note` has none.
    pub fn entity_type(self) -> Option<EntityType> {
        match self {
            Self::Person => Some(EntityType::Person),
            Self::Location => Some(EntityType::Location),
            Self::Event => Some(EntityType::Event),
            Self::Tag => Some(EntityType::Tag),
            Self::Note => None,
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary parsing: trims and lowercases before matching.
impl FromStr for NodeType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim().to_ascii_lowercase().as_str())
            .ok_or_else(|| ValidationError::UnknownNodeType(value.to_string()))
    }
}

/// Persisted node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub deleted: bool,
    /// Replacement node when this one was merged away.
    pub merged: Option<NodeId>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Node {
    /// Whether the node participates in traversal and snapshot views.
    pub fn is_active(&self) -> bool {
        !self.deleted && self.merged.is_none()
    }
}
