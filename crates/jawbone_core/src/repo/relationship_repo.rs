//! Relationship store: single directed legs in the `relationships` table.
//!
//! # Responsibility
//! - Persist single directed legs and look up their partners.
//! - Provide the read paths used by traversal and snapshot views.
//!
//! # Invariants
//! - At most one row exists per ordered `(start_node, end_node)`.
//! - This layer never creates or deletes a reverse leg on its own; pairing
//!   is composed by the graph service inside one unit of work.

use crate::model::node::NodeId;
use crate::model::relationship::{EdgeLabels, Relationship, RelationshipId};
use crate::repo::error::{ConflictError, RecordRef, RepoError, RepoResult};
use crate::repo::sql::{bool_to_int, exists, flag_column, uuid_column};
use log::warn;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const RELATIONSHIP_SELECT_SQL: &str = "SELECT
    id,
    start_node,
    end_node,
    rel,
    ler,
    deleted,
    created_at
FROM relationships";

/// SQLite-backed relationship repository.
pub struct SqliteRelationshipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationshipRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Loads one leg or fails with `NotFound`.
    pub fn require_relationship(&self, id: RelationshipId) -> RepoResult<Relationship> {
        self.get_relationship(id)?
            .ok_or(RepoError::NotFound(RecordRef::Relationship(id)))
    }

    fn node_exists(&self, id: NodeId) -> RepoResult<bool> {
        exists(
            self.conn,
            "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1);",
            [id.to_string()],
        )
    }

    fn query_many(&self, sql: &str, node: Option<NodeId>) -> RepoResult<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match node {
            Some(node) => stmt.query([node.to_string()])?,
            None => stmt.query([])?,
        };
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_relationship_row(row)?);
        }
        Ok(items)
    }

    /// Inserts one leg. Both endpoints must exist; the ordered pair must be free.
    pub fn create_directed_edge(
        &self,
        start: NodeId,
        end: NodeId,
        labels: &EdgeLabels,
    ) -> RepoResult<Relationship> {
        for endpoint in [start, end] {
            if !self.node_exists(endpoint)? {
                return Err(RepoError::NotFound(RecordRef::Node(endpoint)));
            }
        }

        if exists(
            self.conn,
            "SELECT EXISTS(
                SELECT 1 FROM relationships WHERE start_node = ?1 AND end_node = ?2
            );",
            params![start.to_string(), end.to_string()],
        )? {
            return Err(ConflictError::DuplicateEdge { start, end }.into());
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO relationships (id, start_node, end_node, rel, ler)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                start.to_string(),
                end.to_string(),
                labels.rel.as_str(),
                labels.ler.as_str(),
            ],
        )?;
        self.require_relationship(id)
    }

    pub fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RELATIONSHIP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relationship_row(row)?));
        }
        Ok(None)
    }

    /// Fail-fast: the first missing id aborts with `NotFound`.
    pub fn get_relationships(&self, ids: &[RelationshipId]) -> RepoResult<Vec<Relationship>> {
        ids.iter()
            .map(|id| self.require_relationship(*id))
            .collect()
    }

    /// Reverse leg of `relationship`; `NotFound(PartnerOf)` signals corrupted pairing.
    pub fn find_partner(&self, relationship: &Relationship) -> RepoResult<Relationship> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATIONSHIP_SELECT_SQL} WHERE start_node = ?1 AND end_node = ?2;"
        ))?;
        let mut rows = stmt.query(params![
            relationship.end.to_string(),
            relationship.start.to_string()
        ])?;
        if let Some(row) = rows.next()? {
            return parse_relationship_row(row);
        }

        warn!(
            "event=relationship_partner module=repo status=error error_code=partner_missing relationship_id={} start={} end={}",
            relationship.id, relationship.start, relationship.end
        );
        Err(RepoError::NotFound(RecordRef::PartnerOf(relationship.id)))
    }

    pub fn set_relationship_deleted(
        &self,
        id: RelationshipId,
        deleted: bool,
    ) -> RepoResult<Relationship> {
        let changed = self.conn.execute(
            "UPDATE relationships SET deleted = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(deleted)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Relationship(id)));
        }
        self.require_relationship(id)
    }

    /// Removes one leg. Returns whether a row was removed.
    pub fn delete_relationship(&self, id: RelationshipId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM relationships WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    /// Non-deleted legs starting at `start`.
    pub fn outgoing(&self, start: NodeId) -> RepoResult<Vec<Relationship>> {
        self.query_many(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 WHERE start_node = ?1
                   AND deleted = 0
                 ORDER BY created_at ASC, id ASC;"
            ),
            Some(start),
        )
    }

    /// Every leg (any state) with `node` at either end.
    pub fn touching(&self, node: NodeId) -> RepoResult<Vec<Relationship>> {
        self.query_many(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 WHERE start_node = ?1 OR end_node = ?1
                 ORDER BY created_at ASC, id ASC;"
            ),
            Some(node),
        )
    }

    pub fn list_active_relationships(&self) -> RepoResult<Vec<Relationship>> {
        self.query_many(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 WHERE deleted = 0
                 ORDER BY created_at ASC, id ASC;"
            ),
            None,
        )
    }
}

fn parse_relationship_row(row: &Row<'_>) -> RepoResult<Relationship> {
    Ok(Relationship {
        id: uuid_column(row, "id")?,
        start: uuid_column(row, "start_node")?,
        end: uuid_column(row, "end_node")?,
        rel: row.get("rel")?,
        ler: row.get("ler")?,
        deleted: flag_column(row, "deleted")?,
        created_at: row.get("created_at")?,
    })
}
