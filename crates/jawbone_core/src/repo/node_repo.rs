//! Node store over the `nodes` table.
//!
//! # Responsibility
//! - Own node creation and the `deleted`/`merged` lifecycle transitions.
//! - Refuse hard deletes that would orphan referencing rows.
//!
//! # Invariants
//! - Reads never filter by lifecycle unless the method says "active".
//! - Merge is type-homogeneous across sources; the target type is free.
//! - Writes run on whatever connection/transaction the caller supplies.

use crate::model::node::{Node, NodeId, NodeType};
use crate::model::validation::ValidationError;
use crate::repo::error::{ConflictError, RecordRef, RepoError, RepoResult};
use crate::repo::sql::{
    bool_to_int, entity_table, exists, flag_column, optional_uuid_column, uuid_column,
};
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT
    id,
    node_type,
    deleted,
    merged,
    created_at
FROM nodes";

/// SQLite-backed node repository.
pub struct SqliteNodeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNodeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Loads one node or fails with `NotFound`.
    pub fn require_node(&self, id: NodeId) -> RepoResult<Node> {
        self.get_node(id)?
            .ok_or(RepoError::NotFound(RecordRef::Node(id)))
    }

    pub fn create_node(&self, node_type: NodeType) -> RepoResult<Node> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO nodes (id, node_type) VALUES (?1, ?2);",
            params![id.to_string(), node_type.as_str()],
        )?;
        self.require_node(id)
    }

    pub fn get_node(&self, id: NodeId) -> RepoResult<Option<Node>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NODE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_node_row(row)?));
        }
        Ok(None)
    }

    /// Fail-fast: the first missing id aborts with `NotFound`.
    pub fn get_nodes(&self, ids: &[NodeId]) -> RepoResult<Vec<Node>> {
        ids.iter().map(|id| self.require_node(*id)).collect()
    }

    pub fn list_active_nodes(&self) -> RepoResult<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NODE_SELECT_SQL}
             WHERE deleted = 0
               AND merged IS NULL
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }

    pub fn set_node_deleted(&self, id: NodeId, deleted: bool) -> RepoResult<Node> {
        let changed = self.conn.execute(
            "UPDATE nodes SET deleted = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(deleted)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Node(id)));
        }
        self.require_node(id)
    }

    /// Points every source at `target` and returns the updated sources.
    /// The target must be active so every stub resolves to a live node.
    pub fn merge_nodes(&self, target: NodeId, sources: &[NodeId]) -> RepoResult<Vec<Node>> {
        if sources.is_empty() {
            return Err(ValidationError::EmptyMerge.into());
        }
        let target_node = self.require_node(target)?;
        if let Some(merged_into) = target_node.merged {
            return Err(ValidationError::AlreadyMerged {
                node_id: target,
                merged_into,
            }
            .into());
        }
        if target_node.deleted {
            return Err(ValidationError::MergeIntoInactive(target).into());
        }

        let mut seen = HashSet::new();
        let mut expected_type: Option<NodeType> = None;
        for source_id in sources {
            if *source_id == target {
                return Err(ValidationError::MergeIntoSelf(target).into());
            }
            if !seen.insert(*source_id) {
                return Err(ValidationError::DuplicateMergeSource(*source_id).into());
            }

            let source = self.require_node(*source_id)?;
            if let Some(merged_into) = source.merged {
                return Err(ValidationError::AlreadyMerged {
                    node_id: source.id,
                    merged_into,
                }
                .into());
            }
            match expected_type {
                None => expected_type = Some(source.node_type),
                Some(expected) if expected != source.node_type => {
                    return Err(ValidationError::MixedNodeTypes {
                        expected,
                        found: source.node_type,
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        for source_id in sources {
            self.conn.execute(
                "UPDATE nodes SET merged = ?2 WHERE id = ?1;",
                params![source_id.to_string(), target.to_string()],
            )?;
        }

        self.get_nodes(sources)
    }

    pub fn delete_node(&self, id: NodeId) -> RepoResult<()> {
        let node = self.require_node(id)?;
        let id_text = id.to_string();

        if exists(
            self.conn,
            "SELECT EXISTS(
                SELECT 1 FROM relationships WHERE start_node = ?1 OR end_node = ?1
            );",
            [id_text.as_str()],
        )? {
            return Err(ConflictError::NodeInUse {
                node_id: id,
                referenced_by: "relationships",
            }
            .into());
        }

        let owner_table = node.node_type.entity_type().map_or("notes", entity_table);
        if exists(
            self.conn,
            &format!("SELECT EXISTS(SELECT 1 FROM {owner_table} WHERE node_id = ?1);"),
            [id_text.as_str()],
        )? {
            return Err(ConflictError::NodeInUse {
                node_id: id,
                referenced_by: owner_table,
            }
            .into());
        }

        if exists(
            self.conn,
            "SELECT EXISTS(SELECT 1 FROM nodes WHERE merged = ?1);",
            [id_text.as_str()],
        )? {
            return Err(ConflictError::NodeInUse {
                node_id: id,
                referenced_by: "merged nodes",
            }
            .into());
        }

        self.conn
            .execute("DELETE FROM nodes WHERE id = ?1;", [id_text.as_str()])?;
        Ok(())
    }
}

fn parse_node_row(row: &Row<'_>) -> RepoResult<Node> {
    let type_text: String = row.get("node_type")?;
    let node_type = NodeType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid node type `{type_text}` in nodes.node_type"))
    })?;

    Ok(Node {
        id: uuid_column(row, "id")?,
        node_type,
        deleted: flag_column(row, "deleted")?,
        merged: optional_uuid_column(row, "merged")?,
        created_at: row.get("created_at")?,
    })
}
