//! Entity registry service.
//!
//! # Responsibility
//! - Create entities together with their shadow node.
//! - Resolve entities by id, by node id, or from an arbitrary node.
//!
//! # Invariants
//! - An entity row is never written without a node of the matching type in
//!   the same transaction.

use crate::db::with_write_tx;
use crate::model::entity::{Entity, EntityId, EntityType, NewEntity};
use crate::model::node::NodeId;
use crate::model::validation::entity_type_for;
use crate::repo::entity_repo::SqliteEntityRepository;
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::node_repo::SqliteNodeRepository;
use log::info;
use rusqlite::Connection;

pub struct EntityService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> EntityService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates the node and the entity row as one unit.
    pub fn create_entity(&mut self, new_entity: &NewEntity) -> RepoResult<Entity> {
        let entity = with_write_tx(self.conn, |tx| create_entity_in(tx, new_entity))?;
        info!(
            "event=entity_create module=service status=ok entity_type={} entity_id={} node_id={}",
            entity.entity_type(),
            entity.id(),
            entity.node_id()
        );
        Ok(entity)
    }

    pub fn get_entity(&self, entity_type: EntityType, id: EntityId) -> RepoResult<Entity> {
        require_entity_in(self.conn, entity_type, id)
    }

    /// Fail-fast: the first missing id aborts with `NotFound`.
    pub fn get_entities(&self, entity_type: EntityType, ids: &[EntityId]) -> RepoResult<Vec<Entity>> {
        SqliteEntityRepository::new(self.conn).get_entities(entity_type, ids)
    }

    /// Entities owned by any of `node_ids`; unknown ids are skipped.
    pub fn get_entities_by_node_ids(
        &self,
        entity_type: EntityType,
        node_ids: &[NodeId],
    ) -> RepoResult<Vec<Entity>> {
        SqliteEntityRepository::new(self.conn).get_entities_by_node_ids(entity_type, node_ids)
    }

    /// Entity row owned by `node_id`, whatever its type.
    pub fn resolve_entity_for_node(&self, node_id: NodeId) -> RepoResult<Entity> {
        resolve_entity_in(self.conn, node_id)
    }
}

pub(crate) fn create_entity_in(conn: &Connection, new_entity: &NewEntity) -> RepoResult<Entity> {
    let node = SqliteNodeRepository::new(conn).create_node(new_entity.entity_type().node_type())?;
    SqliteEntityRepository::new(conn).insert_entity(node.id, new_entity)
}

pub(crate) fn require_entity_in(
    conn: &Connection,
    entity_type: EntityType,
    id: EntityId,
) -> RepoResult<Entity> {
    SqliteEntityRepository::new(conn)
        .get_entity(entity_type, id)?
        .ok_or(RepoError::NotFound(RecordRef::Entity { entity_type, id }))
}

pub(crate) fn resolve_entity_in(conn: &Connection, node_id: NodeId) -> RepoResult<Entity> {
    let node = SqliteNodeRepository::new(conn).require_node(node_id)?;
    let entity_type = entity_type_for(node.node_type)?;
    SqliteEntityRepository::new(conn)
        .get_entity_by_node(entity_type, node_id)?
        .ok_or(RepoError::NotFound(RecordRef::EntityForNode(node_id)))
}
