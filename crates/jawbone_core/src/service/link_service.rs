//! Linking facade: relationships expressed in terms of entities.

use crate::db::with_write_tx;
use crate::model::entity::{Entity, EntityType};
use crate::model::relationship::{EdgeLabels, RelationshipPair};
use crate::repo::entity_repo::SqliteEntityRepository;
use crate::repo::error::RepoResult;
use crate::service::graph_service::{create_pair_in, linked_nodes_in};
use log::info;
use rusqlite::Connection;

pub struct LinkService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> LinkService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Relates the nodes of `from` and `to` with a forward/reverse pair.
    pub fn link_entities(
        &mut self,
        from: &Entity,
        to: &Entity,
        rel: &str,
        ler: &str,
    ) -> RepoResult<RelationshipPair> {
        let labels = EdgeLabels::new(rel, ler)?;
        let pair = with_write_tx(self.conn, |tx| {
            create_pair_in(tx, from.node_id(), to.node_id(), &labels)
        })?;
        info!(
            "event=entity_link module=service status=ok from_type={} to_type={} forward_id={} reverse_id={}",
            from.entity_type(),
            to.entity_type(),
            pair.forward.id,
            pair.reverse.id
        );
        Ok(pair)
    }

    /// Active neighbours of `entity` that are entities of `entity_type`.
    pub fn linked_entities_of_type(
        &self,
        entity: &Entity,
        entity_type: EntityType,
    ) -> RepoResult<Vec<Entity>> {
        let node_ids = linked_nodes_in(self.conn, entity.node_id())?
            .into_iter()
            .filter(|node| node.node_type == entity_type.node_type())
            .map(|node| node.id)
            .collect::<Vec<_>>();
        SqliteEntityRepository::new(self.conn).get_entities_by_node_ids(entity_type, &node_ids)
    }
}
