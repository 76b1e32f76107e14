//! Entity registry storage: per-variant attribute tables keyed by node id.
//!
//! # Responsibility
//! - Insert/read rows for the closed variant set {person, location, event, tag}.
//! - Mirror node soft-delete state into the owning entity row.
//! - Enforce case-insensitive uniqueness of active tag names.
//!
//! # Invariants
//! - Every row references exactly one node (`node_id UNIQUE NOT NULL`).
//! - Dispatch is by [`EntityType`]; no string lookup happens here.

use crate::model::entity::{
    Entity, EntityId, EntityType, Event, Location, NewEntity, Person, Tag,
};
use crate::model::node::NodeId;
use crate::repo::error::{ConflictError, RecordRef, RepoError, RepoResult};
use crate::repo::sql::{
    bool_to_int, entity_table, exists, flag_column, placeholders, uuid_column,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

/// SQLite-backed entity repository.
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Fails with `Conflict` when an active tag other than `except_node`
    /// already uses `name` (ASCII case-insensitive).
    pub fn ensure_tag_name_available(
        &self,
        name: &str,
        except_node: Option<NodeId>,
    ) -> RepoResult<()> {
        let taken = exists(
            self.conn,
            "SELECT EXISTS(
                SELECT 1
                FROM tags
                WHERE name = ?1 COLLATE NOCASE
                  AND deleted = 0
                  AND (?2 IS NULL OR node_id <> ?2)
            );",
            params![name, except_node.map(|id| id.to_string())],
        )?;
        if taken {
            return Err(ConflictError::DuplicateTagName(name.to_string()).into());
        }
        Ok(())
    }

    fn query_entities(
        &self,
        entity_type: EntityType,
        filter: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<Entity>> {
        let sql = format!(
            "{} WHERE {filter} ORDER BY created_at ASC, id ASC;",
            select_sql(entity_type)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_entity_row(entity_type, row)?);
        }
        Ok(items)
    }

    /// Inserts the variant row for an already-created node.
    pub fn insert_entity(&self, node_id: NodeId, new_entity: &NewEntity) -> RepoResult<Entity> {
        new_entity.validate()?;

        let id = Uuid::new_v4();
        let id_text = id.to_string();
        let node_text = node_id.to_string();
        let name = new_entity.name().trim();

        match new_entity {
            NewEntity::Person(value) => {
                self.conn.execute(
                    "INSERT INTO people (id, node_id, name, content, gender)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        id_text,
                        node_text,
                        name,
                        value.content.as_str(),
                        value.gender.as_deref(),
                    ],
                )?;
            }
            NewEntity::Location(value) => {
                self.conn.execute(
                    "INSERT INTO locations (id, node_id, name, content, country, district, town)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                    params![
                        id_text,
                        node_text,
                        name,
                        value.content.as_str(),
                        value.country.as_deref(),
                        value.district.as_deref(),
                        value.town.as_deref(),
                    ],
                )?;
            }
            NewEntity::Event(value) => {
                self.conn.execute(
                    "INSERT INTO events (id, node_id, name, content, date)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![id_text, node_text, name, value.content.as_str(), value.date],
                )?;
            }
            NewEntity::Tag(_) => {
                self.ensure_tag_name_available(name, None)?;
                self.conn.execute(
                    "INSERT INTO tags (id, node_id, name) VALUES (?1, ?2, ?3);",
                    params![id_text, node_text, name],
                )?;
            }
        }

        let entity_type = new_entity.entity_type();
        self.get_entity(entity_type, id)?
            .ok_or(RepoError::NotFound(RecordRef::Entity { entity_type, id }))
    }

    pub fn get_entity(&self, entity_type: EntityType, id: EntityId) -> RepoResult<Option<Entity>> {
        let mut items = self.query_entities(
            entity_type,
            "id = ?",
            vec![Value::Text(id.to_string())],
        )?;
        Ok(items.pop())
    }

    /// Fail-fast: the first missing id aborts with `NotFound`.
    pub fn get_entities(&self, entity_type: EntityType, ids: &[EntityId]) -> RepoResult<Vec<Entity>> {
        ids.iter()
            .map(|id| {
                self.get_entity(entity_type, *id)?
                    .ok_or(RepoError::NotFound(RecordRef::Entity {
                        entity_type,
                        id: *id,
                    }))
            })
            .collect()
    }

    pub fn get_entities_by_node_ids(
        &self,
        entity_type: EntityType,
        node_ids: &[NodeId],
    ) -> RepoResult<Vec<Entity>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let bind_values = node_ids
            .iter()
            .map(|id| Value::Text(id.to_string()))
            .collect::<Vec<_>>();
        self.query_entities(
            entity_type,
            &format!("node_id IN ({})", placeholders(node_ids.len())),
            bind_values,
        )
    }

    pub fn get_entity_by_node(
        &self,
        entity_type: EntityType,
        node_id: NodeId,
    ) -> RepoResult<Option<Entity>> {
        let mut items = self.query_entities(
            entity_type,
            "node_id = ?",
            vec![Value::Text(node_id.to_string())],
        )?;
        Ok(items.pop())
    }

    /// Sets the soft-delete mirror. Returns the number of rows changed.
    pub fn set_entity_deleted_for_node(
        &self,
        entity_type: EntityType,
        node_id: NodeId,
        deleted: bool,
    ) -> RepoResult<usize> {
        if entity_type == EntityType::Tag && !deleted {
            if let Some(tag) = self.get_entity_by_node(entity_type, node_id)? {
                self.ensure_tag_name_available(tag.name(), Some(node_id))?;
            }
        }

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET deleted = ?2 WHERE node_id = ?1;",
                entity_table(entity_type)
            ),
            params![node_id.to_string(), bool_to_int(deleted)],
        )?;
        Ok(changed)
    }

    /// Removes the row owned by `node_id`. Returns the number of rows removed.
    pub fn delete_entity_for_node(
        &self,
        entity_type: EntityType,
        node_id: NodeId,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE node_id = ?1;",
                entity_table(entity_type)
            ),
            [node_id.to_string()],
        )?;
        Ok(changed)
    }
}

fn select_sql(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Person => {
            "SELECT id, node_id, name, content, gender, deleted, created_at FROM people"
        }
        EntityType::Location => {
            "SELECT id, node_id, name, content, country, district, town, deleted, created_at
             FROM locations"
        }
        EntityType::Event => {
            "SELECT id, node_id, name, content, date, deleted, created_at FROM events"
        }
        EntityType::Tag => "SELECT id, node_id, name, deleted, created_at FROM tags",
    }
}

fn parse_entity_row(entity_type: EntityType, row: &Row<'_>) -> RepoResult<Entity> {
    let id = uuid_column(row, "id")?;
    let node_id = uuid_column(row, "node_id")?;
    let name: String = row.get("name")?;
    let deleted = flag_column(row, "deleted")?;
    let created_at: i64 = row.get("created_at")?;

    let entity = match entity_type {
        EntityType::Person => Entity::Person(Person {
            id,
            node_id,
            name,
            content: row.get("content")?,
            gender: row.get("gender")?,
            deleted,
            created_at,
        }),
        EntityType::Location => Entity::Location(Location {
            id,
            node_id,
            name,
            content: row.get("content")?,
            country: row.get("country")?,
            district: row.get("district")?,
            town: row.get("town")?,
            deleted,
            created_at,
        }),
        EntityType::Event => Entity::Event(Event {
            id,
            node_id,
            name,
            content: row.get("content")?,
            date: row.get("date")?,
            deleted,
            created_at,
        }),
        EntityType::Tag => Entity::Tag(Tag {
            id,
            node_id,
            name,
            deleted,
            created_at,
        }),
    };
    Ok(entity)
}
