//! Entity model: typed domain records shadowed 1:1 by graph nodes.
//!
//! # Responsibility
//! - Define the closed variant set {Person, Location, Event, Tag}.
//! - Validate creation attributes per variant.
//!
//! # Invariants
//! - `node_id` is set at creation and never reassigned.
//! - `deleted` mirrors the owning node's `deleted` flag.
//! - Names are stored trimmed.

use crate::model::node::{NodeId, NodeType};
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of an entity row (distinct from its node id).
pub type EntityId = Uuid;

/// Entity variants with an attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Location,
    Event,
    Tag,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Person,
        EntityType::Location,
        EntityType::Event,
        EntityType::Tag,
    ];

    pub fn as_str(self) -> &'static str {
        self.node_type().as_str()
    }

    /// Node type created for entities of this variant.
    pub fn node_type(self) -> NodeType {
        match self {
            Self::Person => NodeType::Person,
            Self::Location => NodeType::Location,
            Self::Event => NodeType::Event,
            Self::Tag => NodeType::Tag,
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NodeType::parse(value.trim().to_ascii_lowercase().as_str())
            .and_then(NodeType::entity_type)
            .ok_or_else(|| ValidationError::UnknownEntityType(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: EntityId,
    pub node_id: NodeId,
    pub name: String,
    pub content: String,
    pub gender: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: EntityId,
    pub node_id: NodeId,
    pub name: String,
    pub content: String,
    pub country: Option<String>,
    pub district: Option<String>,
    pub town: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EntityId,
    pub node_id: NodeId,
    pub name: String,
    pub content: String,
    /// Epoch milliseconds, when known.
    pub date: Option<i64>,
    pub deleted: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub node_id: NodeId,
    pub name: String,
    pub deleted: bool,
    pub created_at: i64,
}

/// Any persisted entity. Serialized with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Person(Person),
    Location(Location),
    Event(Event),
    Tag(Tag),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Person(value) => value.id,
            Self::Location(value) => value.id,
            Self::Event(value) => value.id,
            Self::Tag(value) => value.id,
        }
    }

    pub fn node_id(&self) -> NodeId {
        match self {
            Self::Person(value) => value.node_id,
            Self::Location(value) => value.node_id,
            Self::Event(value) => value.node_id,
            Self::Tag(value) => value.node_id,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Person(_) => EntityType::Person,
            Self::Location(_) => EntityType::Location,
            Self::Event(_) => EntityType::Event,
            Self::Tag(_) => EntityType::Tag,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Person(value) => &value.name,
            Self::Location(value) => &value.name,
            Self::Event(value) => &value.name,
            Self::Tag(value) => &value.name,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Self::Person(value) => value.deleted,
            Self::Location(value) => value.deleted,
            Self::Event(value) => value.deleted,
            Self::Tag(value) => value.deleted,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub content: String,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLocation {
    pub name: String,
    pub content: String,
    pub country: Option<String>,
    pub district: Option<String>,
    pub town: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub content: String,
    pub date: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
}

/// Creation attributes, one variant per entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewEntity {
    Person(NewPerson),
    Location(NewLocation),
    Event(NewEvent),
    Tag(NewTag),
}

impl NewEntity {
    /// Person with only the required attributes.
    pub fn person(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Person(NewPerson {
            name: name.into(),
            content: content.into(),
            gender: None,
        })
    }

    /// Location with only the required attributes.
    pub fn location(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Location(NewLocation {
            name: name.into(),
            content: content.into(),
            ..NewLocation::default()
        })
    }

    /// Event with only the required attributes.
    pub fn event(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Event(NewEvent {
            name: name.into(),
            content: content.into(),
            date: None,
        })
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(NewTag { name: name.into() })
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Person(_) => EntityType::Person,
            Self::Location(_) => EntityType::Location,
            Self::Event(_) => EntityType::Event,
            Self::Tag(_) => EntityType::Tag,
        }
    }

    /// Checks required attributes. Content may be empty; names may not.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let record = self.entity_type().as_str();
        require_text(self.name(), record, "name")?;
        Ok(())
    }

    /// Raw (untrimmed) name attribute.
    pub fn name(&self) -> &str {
        match self {
            Self::Person(value) => &value.name,
            Self::Location(value) => &value.name,
            Self::Event(value) => &value.name,
            Self::Tag(value) => &value.name,
        }
    }
}
