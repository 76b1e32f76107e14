//! Graph use-case service: node lifecycle, relationship pairing and
//! traversal views.
//!
//! # Responsibility
//! - Run every write as exactly one unit of work (`with_write_tx`).
//! - Compose single-leg relationship writes into forward/reverse pairs.
//! - Mirror node soft-delete state into the owning entity row.
//! - Build the whole-graph snapshot read model.
//!
//! # Invariants
//! - A relationship pair is created, soft-deleted, restored and hard-deleted
//!   together; a failure on either leg rolls back both.
//! - Traversal views exclude deleted relationships and deleted/merged nodes.
//! - Helpers ending in `_in` run on a caller-supplied transaction and never
//!   commit on their own.

use crate::db::with_write_tx;
use crate::model::entity::{Entity, EntityType};
use crate::model::node::{Node, NodeId, NodeType};
use crate::model::relationship::{EdgeLabels, Relationship, RelationshipId, RelationshipPair};
use crate::model::validation::ValidationError;
use crate::repo::entity_repo::SqliteEntityRepository;
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::node_repo::SqliteNodeRepository;
use crate::repo::relationship_repo::SqliteRelationshipRepository;
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One active node in the snapshot, joined with its entity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub node_id: NodeId,
    /// Node creation time in epoch milliseconds.
    pub created: i64,
    pub node_type: NodeType,
    /// `None` for node types without an entity table.
    pub entity: Option<Entity>,
}

/// Whole-graph read model used by visualisation callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub relationships: Vec<Relationship>,
}

/// Service facade over node and relationship stores.
pub struct GraphService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> GraphService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a standalone node of `node_type`.
    pub fn create_node(&mut self, node_type: NodeType) -> RepoResult<Node> {
        let node = with_write_tx(self.conn, |tx| {
            SqliteNodeRepository::new(tx).create_node(node_type)
        })?;
        info!(
            "event=node_create module=service status=ok node_id={} node_type={}",
            node.id, node.node_type
        );
        Ok(node)
    }

    pub fn get_node(&self, id: NodeId) -> RepoResult<Node> {
        SqliteNodeRepository::new(self.conn).require_node(id)
    }

    pub fn get_nodes(&self, ids: &[NodeId]) -> RepoResult<Vec<Node>> {
        SqliteNodeRepository::new(self.conn).get_nodes(ids)
    }

    pub fn list_active_nodes(&self) -> RepoResult<Vec<Node>> {
        SqliteNodeRepository::new(self.conn).list_active_nodes()
    }

    /// Marks the node (and its entity row) deleted. Repeated calls succeed.
    pub fn soft_delete_node(&mut self, id: NodeId) -> RepoResult<Node> {
        let node = with_write_tx(self.conn, |tx| set_node_deleted_in(tx, id, true))?;
        info!("event=node_soft_delete module=service status=ok node_id={id}");
        Ok(node)
    }

    /// Clears the deleted flag on the node and its entity row.
    pub fn restore_node(&mut self, id: NodeId) -> RepoResult<Node> {
        let node = with_write_tx(self.conn, |tx| set_node_deleted_in(tx, id, false))?;
        info!("event=node_restore module=service status=ok node_id={id}");
        Ok(node)
    }

    /// Permanently removes an unreferenced node.
    pub fn hard_delete_node(&mut self, id: NodeId) -> RepoResult<()> {
        with_write_tx(self.conn, |tx| SqliteNodeRepository::new(tx).delete_node(id))?;
        info!("event=node_hard_delete module=service status=ok node_id={id}");
        Ok(())
    }

    /// Points every source at `target`.
    pub fn merge_nodes(&mut self, target: NodeId, sources: &[NodeId]) -> RepoResult<Vec<Node>> {
        let merged = with_write_tx(self.conn, |tx| {
            SqliteNodeRepository::new(tx).merge_nodes(target, sources)
        })?;
        info!(
            "event=node_merge module=service status=ok target={target} sources={}",
            merged.len()
        );
        Ok(merged)
    }

    /// Creates a node of the sources' common type and merges them into it.
    ///
    /// Returns `[new, ...sources]`.
    pub fn merge_into_new_node(&mut self, ids: &[NodeId]) -> RepoResult<Vec<Node>> {
        let nodes = with_write_tx(self.conn, |tx| merge_into_new_node_in(tx, ids))?;
        if let Some(created) = nodes.first() {
            info!(
                "event=node_merge_new module=service status=ok node_id={} node_type={} sources={}",
                created.id,
                created.node_type,
                ids.len()
            );
        }
        Ok(nodes)
    }

    /// Inserts a single leg without its reverse.
    pub fn create_directed_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        rel: &str,
        ler: &str,
    ) -> RepoResult<Relationship> {
        let labels = EdgeLabels::new(rel, ler)?;
        let edge = with_write_tx(self.conn, |tx| {
            SqliteRelationshipRepository::new(tx).create_directed_edge(start, end, &labels)
        })?;
        info!(
            "event=edge_create module=service status=ok relationship_id={} start={start} end={end}",
            edge.id
        );
        Ok(edge)
    }

    /// Creates `a -> b` and its reverse `b -> a` as one unit.
    pub fn create_relationship(
        &mut self,
        a: NodeId,
        b: NodeId,
        rel: &str,
        ler: &str,
    ) -> RepoResult<RelationshipPair> {
        let labels = EdgeLabels::new(rel, ler)?;
        let pair = with_write_tx(self.conn, |tx| create_pair_in(tx, a, b, &labels))?;
        info!(
            "event=relationship_create module=service status=ok forward_id={} reverse_id={} start={a} end={b}",
            pair.forward.id, pair.reverse.id
        );
        Ok(pair)
    }

    pub fn get_relationship(&self, id: RelationshipId) -> RepoResult<Relationship> {
        SqliteRelationshipRepository::new(self.conn).require_relationship(id)
    }

    pub fn get_relationships(&self, ids: &[RelationshipId]) -> RepoResult<Vec<Relationship>> {
        SqliteRelationshipRepository::new(self.conn).get_relationships(ids)
    }

    pub fn find_partner(&self, relationship: &Relationship) -> RepoResult<Relationship> {
        SqliteRelationshipRepository::new(self.conn).find_partner(relationship)
    }

    pub fn list_active_relationships(&self) -> RepoResult<Vec<Relationship>> {
        SqliteRelationshipRepository::new(self.conn).list_active_relationships()
    }

    /// Soft-deletes the leg and its partner. Repeated calls succeed.
    pub fn soft_delete_relationship(&mut self, id: RelationshipId) -> RepoResult<RelationshipPair> {
        let pair = with_write_tx(self.conn, |tx| set_pair_deleted_in(tx, id, true))?;
        info!(
            "event=relationship_soft_delete module=service status=ok relationship_id={id} partner_id={}",
            pair.reverse.id
        );
        Ok(pair)
    }

    pub fn restore_relationship(&mut self, id: RelationshipId) -> RepoResult<RelationshipPair> {
        let pair = with_write_tx(self.conn, |tx| set_pair_deleted_in(tx, id, false))?;
        info!(
            "event=relationship_restore module=service status=ok relationship_id={id} partner_id={}",
            pair.reverse.id
        );
        Ok(pair)
    }

    /// Removes the leg and, when still present, its partner.
    pub fn hard_delete_relationship(&mut self, id: RelationshipId) -> RepoResult<()> {
        let removed = with_write_tx(self.conn, |tx| hard_delete_pair_in(tx, id))?;
        info!("event=relationship_hard_delete module=service status=ok relationship_id={id} removed={removed}");
        Ok(())
    }

    /// Active neighbours reached through non-deleted outgoing legs.
    pub fn linked_nodes(&self, node: NodeId) -> RepoResult<Vec<Node>> {
        linked_nodes_in(self.conn, node)
    }

    pub fn snapshot(&self) -> RepoResult<GraphSnapshot> {
        let nodes = SqliteNodeRepository::new(self.conn).list_active_nodes()?;
        let entity_repo = SqliteEntityRepository::new(self.conn);

        let mut entities: HashMap<NodeId, Entity> = HashMap::new();
        for entity_type in EntityType::ALL {
            let node_ids = nodes
                .iter()
                .filter(|node| node.node_type.entity_type() == Some(entity_type))
                .map(|node| node.id)
                .collect::<Vec<_>>();
            for entity in entity_repo.get_entities_by_node_ids(entity_type, &node_ids)? {
                entities.insert(entity.node_id(), entity);
            }
        }

        let active = nodes.iter().map(|node| node.id).collect::<HashSet<_>>();
        let relationships = SqliteRelationshipRepository::new(self.conn)
            .list_active_relationships()?
            .into_iter()
            .filter(|edge| active.contains(&edge.start) && active.contains(&edge.end))
            .collect::<Vec<_>>();

        let nodes = nodes
            .into_iter()
            .map(|node| SnapshotNode {
                node_id: node.id,
                created: node.created_at,
                node_type: node.node_type,
                entity: entities.remove(&node.id),
            })
            .collect::<Vec<_>>();

        Ok(GraphSnapshot {
            nodes,
            relationships,
        })
    }
}

/// Sets `deleted` on the node and mirrors it into its entity row.
pub(crate) fn set_node_deleted_in(conn: &Connection, id: NodeId, deleted: bool) -> RepoResult<Node> {
    let node_repo = SqliteNodeRepository::new(conn);
    let current = node_repo.require_node(id)?;
    if let Some(entity_type) = current.node_type.entity_type() {
        SqliteEntityRepository::new(conn).set_entity_deleted_for_node(entity_type, id, deleted)?;
    }
    node_repo.set_node_deleted(id, deleted)
}

pub(crate) fn create_pair_in(
    conn: &Connection,
    a: NodeId,
    b: NodeId,
    labels: &EdgeLabels,
) -> RepoResult<RelationshipPair> {
    if a == b {
        return Err(ValidationError::SelfRelationship(a).into());
    }
    let repo = SqliteRelationshipRepository::new(conn);
    let forward = repo.create_directed_edge(a, b, labels)?;
    let reverse = repo.create_directed_edge(b, a, &labels.reversed())?;
    Ok(RelationshipPair { forward, reverse })
}

fn set_pair_deleted_in(
    conn: &Connection,
    id: RelationshipId,
    deleted: bool,
) -> RepoResult<RelationshipPair> {
    let repo = SqliteRelationshipRepository::new(conn);
    let edge = repo.require_relationship(id)?;
    let partner = repo.find_partner(&edge)?;
    let forward = repo.set_relationship_deleted(edge.id, deleted)?;
    let reverse = repo.set_relationship_deleted(partner.id, deleted)?;
    Ok(RelationshipPair { forward, reverse })
}

/// Returns how many legs were removed (1 when the partner was already gone).
fn hard_delete_pair_in(conn: &Connection, id: RelationshipId) -> RepoResult<usize> {
    let repo = SqliteRelationshipRepository::new(conn);
    let edge = repo.require_relationship(id)?;
    let partner = match repo.find_partner(&edge) {
        Ok(partner) => Some(partner),
        Err(RepoError::NotFound(RecordRef::PartnerOf(_))) => None,
        Err(err) => return Err(err),
    };

    let mut removed = usize::from(repo.delete_relationship(edge.id)?);
    if let Some(partner) = partner {
        removed += usize::from(repo.delete_relationship(partner.id)?);
    }
    Ok(removed)
}

/// Removes every leg (any state) touching `node`. Returns the count removed.
pub(crate) fn detach_node_in(conn: &Connection, node: NodeId) -> RepoResult<usize> {
    let repo = SqliteRelationshipRepository::new(conn);
    let mut removed = 0;
    for edge in repo.touching(node)? {
        removed += usize::from(repo.delete_relationship(edge.id)?);
    }
    Ok(removed)
}

fn merge_into_new_node_in(conn: &Connection, ids: &[NodeId]) -> RepoResult<Vec<Node>> {
    let node_repo = SqliteNodeRepository::new(conn);
    let sources = node_repo.get_nodes(ids)?;
    let node_type = common_node_type(sources.iter().map(|node| node.node_type))?;

    let created = node_repo.create_node(node_type)?;
    let merged = node_repo.merge_nodes(created.id, ids)?;

    let mut nodes = Vec::with_capacity(merged.len() + 1);
    nodes.push(created);
    nodes.extend(merged);
    Ok(nodes)
}

/// Single node type shared by all `types`; fails on empty or mixed input.
pub(crate) fn common_node_type(
    types: impl IntoIterator<Item = NodeType>,
) -> Result<NodeType, ValidationError> {
    let mut types = types.into_iter();
    let expected = types.next().ok_or(ValidationError::EmptyMerge)?;
    for found in types {
        if found != expected {
            return Err(ValidationError::MixedNodeTypes { expected, found });
        }
    }
    Ok(expected)
}

pub(crate) fn linked_nodes_in(conn: &Connection, node: NodeId) -> RepoResult<Vec<Node>> {
    let node_repo = SqliteNodeRepository::new(conn);
    node_repo.require_node(node)?;

    let mut linked = Vec::new();
    for edge in SqliteRelationshipRepository::new(conn).outgoing(node)? {
        let neighbour = node_repo.require_node(edge.end)?;
        if neighbour.is_active() {
            linked.push(neighbour);
        }
    }
    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::common_node_type;
    use crate::model::node::NodeType;
    use crate::model::validation::ValidationError;

    #[test]
    fn common_node_type_requires_homogeneous_input() {
        assert_eq!(
            common_node_type([NodeType::Tag, NodeType::Tag]),
            Ok(NodeType::Tag)
        );
        assert_eq!(
            common_node_type([NodeType::Person, NodeType::Event]),
            Err(ValidationError::MixedNodeTypes {
                expected: NodeType::Person,
                found: NodeType::Event,
            })
        );
        assert_eq!(common_node_type([]), Err(ValidationError::EmptyMerge));
    }
}
