//! Note repository over the `notes` table.
//!
//! # Responsibility
//! - Persist notes attached to pages, each with its own `note` node.
//! - Track the optional node a note annotates.
//! - Own note soft-delete and resolved flags.
//!
//! # Invariants
//! - A note always references an existing page.
//! - A note's own node cannot be hard-deleted while the note exists.
//! - Hard-deleting an annotated node clears `annotates`.
//! - List/search paths exclude deleted notes unless asked otherwise.

use crate::model::node::NodeId;
use crate::model::note::{NewNote, Note, NoteId};
use crate::model::validation::require_text;
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::sql::{bool_to_int, exists, flag_column, optional_uuid_column, uuid_column};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    page_number,
    node_id,
    annotates,
    note_text,
    content,
    text_start,
    text_end,
    deleted,
    resolved,
    created_at,
    updated_at
FROM notes";

pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_note(&self, id: NoteId) -> RepoResult<Note> {
        self.get_note(id)?
            .ok_or(RepoError::NotFound(RecordRef::Note(id)))
    }

    fn query_notes<P: rusqlite::Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE {filter} ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params)?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn update_flag(&self, id: NoteId, column: &'static str, value: bool) -> RepoResult<Note> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE notes
                 SET {column} = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;"
            ),
            params![id.to_string(), bool_to_int(value)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Note(id)));
        }
        self.require_note(id)
    }

    /// Inserts a note owned by `node_id`, a freshly created `note` node.
    pub fn create_note(&self, node_id: NodeId, note: &NewNote) -> RepoResult<Note> {
        let note_text = require_text(&note.note_text, "note", "note_text")?;

        if !exists(
            self.conn,
            "SELECT EXISTS(SELECT 1 FROM pages WHERE page_number = ?1);",
            [note.page_number],
        )? {
            return Err(RepoError::NotFound(RecordRef::Page(note.page_number)));
        }
        if let Some(annotated) = note.annotates {
            if !exists(
                self.conn,
                "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1);",
                [annotated.to_string()],
            )? {
                return Err(RepoError::NotFound(RecordRef::Node(annotated)));
            }
        }

        let id = Uuid::new_v4();
        let (text_start, text_end) = note.text_range();
        self.conn.execute(
            "INSERT INTO notes (
                id,
                page_number,
                node_id,
                annotates,
                note_text,
                content,
                text_start,
                text_end
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                note.page_number,
                node_id.to_string(),
                note.annotates.map(|value| value.to_string()),
                note_text,
                note.content.as_str(),
                text_start,
                text_end,
            ],
        )?;
        self.require_note(id)
    }

    pub fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut notes = self.query_notes("id = ?1", [id.to_string()])?;
        Ok(notes.pop())
    }

    /// Fail-fast: the first missing id aborts with `NotFound`.
    pub fn get_notes(&self, ids: &[NoteId]) -> RepoResult<Vec<Note>> {
        ids.iter().map(|id| self.require_note(*id)).collect()
    }

    pub fn notes_on_page(&self, page_number: i64, include_deleted: bool) -> RepoResult<Vec<Note>> {
        self.query_notes(
            "page_number = ?1 AND (?2 = 1 OR deleted = 0)",
            params![page_number, bool_to_int(include_deleted)],
        )
    }

    /// Note owning `node_id`, deleted or not.
    pub fn note_by_node(&self, node_id: NodeId) -> RepoResult<Option<Note>> {
        let mut notes = self.query_notes("node_id = ?1", [node_id.to_string()])?;
        Ok(notes.pop())
    }

    /// Active notes annotating `node_id`.
    pub fn notes_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Note>> {
        self.query_notes("annotates = ?1 AND deleted = 0", [node_id.to_string()])
    }

    /// Active notes whose content or quoted text contains `term`.
    pub fn search_notes(&self, term: &str) -> RepoResult<Vec<Note>> {
        self.query_notes(
            "deleted = 0
             AND (
               instr(lower(content), lower(?1)) > 0
               OR instr(lower(note_text), lower(?1)) > 0
             )",
            [term],
        )
    }

    pub fn update_note_content(&self, id: NoteId, content: &str) -> RepoResult<Note> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET content = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), content],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Note(id)));
        }
        self.require_note(id)
    }

    pub fn set_note_deleted(&self, id: NoteId, deleted: bool) -> RepoResult<Note> {
        self.update_flag(id, "deleted", deleted)
    }

    pub fn set_note_resolved(&self, id: NoteId, resolved: bool) -> RepoResult<Note> {
        self.update_flag(id, "resolved", resolved)
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    Ok(Note {
        id: uuid_column(row, "id")?,
        page_number: row.get("page_number")?,
        node_id: uuid_column(row, "node_id")?,
        annotates: optional_uuid_column(row, "annotates")?,
        note_text: row.get("note_text")?,
        content: row.get("content")?,
        text_start: row.get("text_start")?,
        text_end: row.get("text_end")?,
        deleted: flag_column(row, "deleted")?,
        resolved: flag_column(row, "resolved")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
