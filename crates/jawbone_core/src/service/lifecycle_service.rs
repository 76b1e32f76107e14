//! Merge/delete coordinator for entities.
//!
//! # Responsibility
//! - Move an entity row and its node through soft delete, restore, hard
//!   delete and merge together.
//!
//! # Invariants
//! - Each operation is one transaction; node and entity state never diverge.
//! - Hard delete removes relationship pairs, then the entity row, then the
//!   node.
//! - Merge sources must share one node type; the new entity's type is free.

use crate::db::with_write_tx;
use crate::model::entity::{Entity, NewEntity};
use crate::model::node::NodeId;
use crate::repo::entity_repo::SqliteEntityRepository;
use crate::repo::error::RepoResult;
use crate::repo::node_repo::SqliteNodeRepository;
use crate::service::entity_service::{create_entity_in, require_entity_in};
use crate::service::graph_service::{common_node_type, detach_node_in, set_node_deleted_in};
use log::info;
use rusqlite::Connection;

pub struct LifecycleService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> LifecycleService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn soft_delete_entity(&mut self, entity: &Entity) -> RepoResult<Entity> {
        let updated = with_write_tx(self.conn, |tx| set_entity_deleted_in(tx, entity, true))?;
        info!(
            "event=entity_soft_delete module=service status=ok entity_type={} entity_id={}",
            updated.entity_type(),
            updated.id()
        );
        Ok(updated)
    }

    pub fn restore_entity(&mut self, entity: &Entity) -> RepoResult<Entity> {
        let updated = with_write_tx(self.conn, |tx| set_entity_deleted_in(tx, entity, false))?;
        info!(
            "event=entity_restore module=service status=ok entity_type={} entity_id={}",
            updated.entity_type(),
            updated.id()
        );
        Ok(updated)
    }

    /// Removes the entity, its node and every relationship touching it.
    pub fn hard_delete_entity(&mut self, entity: &Entity) -> RepoResult<()> {
        let detached = with_write_tx(self.conn, |tx| -> RepoResult<usize> {
            let current = require_entity_in(tx, entity.entity_type(), entity.id())?;
            let node_id = current.node_id();
            let node_repo = SqliteNodeRepository::new(tx);
            node_repo.require_node(node_id)?;

            let detached = detach_node_in(tx, node_id)?;
            SqliteEntityRepository::new(tx).delete_entity_for_node(current.entity_type(), node_id)?;
            node_repo.delete_node(node_id)?;
            Ok(detached)
        })?;
        info!(
            "event=entity_hard_delete module=service status=ok entity_type={} entity_id={} node_id={} relationships_removed={detached}",
            entity.entity_type(),
            entity.id(),
            entity.node_id()
        );
        Ok(())
    }

    /// Creates a new entity from `attrs` and merges every source node into it.
    pub fn merge_entities_into_new(
        &mut self,
        sources: &[Entity],
        attrs: &NewEntity,
    ) -> RepoResult<Entity> {
        let created = with_write_tx(self.conn, |tx| -> RepoResult<Entity> {
            common_node_type(
                sources
                    .iter()
                    .map(|entity| entity.entity_type().node_type()),
            )?;
            let created = create_entity_in(tx, attrs)?;
            let source_nodes = sources
                .iter()
                .map(|entity| entity.node_id())
                .collect::<Vec<NodeId>>();
            SqliteNodeRepository::new(tx).merge_nodes(created.node_id(), &source_nodes)?;
            Ok(created)
        })?;
        info!(
            "event=entity_merge module=service status=ok entity_type={} entity_id={} node_id={} sources={}",
            created.entity_type(),
            created.id(),
            created.node_id(),
            sources.len()
        );
        Ok(created)
    }
}

fn set_entity_deleted_in(conn: &Connection, entity: &Entity, deleted: bool) -> RepoResult<Entity> {
    let current = require_entity_in(conn, entity.entity_type(), entity.id())?;
    set_node_deleted_in(conn, current.node_id(), deleted)?;
    require_entity_in(conn, current.entity_type(), current.id())
}
