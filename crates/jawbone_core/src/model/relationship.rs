//! Relationship model: directed, labeled edges stored as reverse pairs.
//!
//! # Invariants
//! - `rel` reads start -> end, `ler` reads end -> start.
//! - The partner of `(a, b, rel, ler)` is `(b, a, ler, rel)`.
//! - Both legs of a pair always share the same `deleted` value.

use crate::model::node::NodeId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier of one relationship leg.
pub type RelationshipId = Uuid;

/// Persisted directed edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub start: NodeId,
    pub end: NodeId,
    /// Forward label, e.g. `visited`.
    pub rel: String,
    /// Reverse label, e.g. `was visited by`.
    pub ler: String,
    pub deleted: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Relationship {
    /// Whether `other` is the reverse leg of this edge.
    pub fn is_partner_of(&self, other: &Relationship) -> bool {
        self.id != other.id
            && self.start == other.end
            && self.end == other.start
            && self.rel == other.ler
            && self.ler == other.rel
    }
}

/// Both legs of one logical edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPair {
    /// The leg that was addressed by the caller.
    pub forward: Relationship,
    /// Its partner.
    pub reverse: Relationship,
}

impl RelationshipPair {
    /// Request-layer shape: both records keyed by their id.
    pub fn into_map(self) -> BTreeMap<RelationshipId, Relationship> {
        let mut map = BTreeMap::new();
        map.insert(self.forward.id, self.forward);
        map.insert(self.reverse.id, self.reverse);
        map
    }
}

/// Labels used to create a pair, trimmed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabels {
    pub rel: String,
    pub ler: String,
}

impl EdgeLabels {
    pub fn new(rel: &str, ler: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            rel: require_text(rel, "relationship", "rel")?.to_string(),
            ler: require_text(ler, "relationship", "ler")?.to_string(),
        })
    }

    /// Labels as seen from the other end.
    pub fn reversed(&self) -> Self {
        Self {
            rel: self.ler.clone(),
            ler: self.rel.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgeLabels, Relationship};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn leg(start: Uuid, end: Uuid, rel: &str, ler: &str) -> Relationship {
        Relationship {
            id: Uuid::new_v4(),
            start,
            end,
            rel: rel.to_string(),
            ler: ler.to_string(),
            deleted: false,
            created_at: 0,
        }
    }

    #[test]
    fn partner_requires_swapped_endpoints_and_labels() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let forward = leg(a, b, "visited", "was visited by");
        let reverse = leg(b, a, "was visited by", "visited");
        let wrong_labels = leg(b, a, "visited", "was visited by");

        assert!(forward.is_partner_of(&reverse));
        assert!(reverse.is_partner_of(&forward));
        assert!(!forward.is_partner_of(&wrong_labels));
        assert!(!forward.is_partner_of(&forward));
    }

    #[test]
    fn labels_are_trimmed_and_required() {
        let labels = EdgeLabels::new(" attended ", "was attended by").unwrap();
        assert_eq!(labels.rel, "attended");
        assert_eq!(labels.reversed().rel, "was attended by");

        let err = EdgeLabels::new("attended", "  ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::BlankField {
                record: "relationship",
                field: "ler"
            }
        );
    }
}
