//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/get/list/search APIs.
//! - Own note soft delete, restore and resolved state.
//!
//! # Invariants
//! - Creating a note creates its `note` node in the same transaction.
//! - Note lifecycle never touches node or relationship state.
//! - Search results are the union of per-term matches, deduplicated and
//!   ordered by `created_at ASC, id ASC`.
//! - Logs carry ids and counts only, never note text.

use crate::db::with_write_tx;
use crate::model::node::{NodeId, NodeType};
use crate::model::note::{NewNote, Note, NoteId};
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::node_repo::SqliteNodeRepository;
use crate::repo::note_repo::SqliteNoteRepository;
use crate::repo::page_repo::SqlitePageRepository;
use log::info;
use rusqlite::Connection;
use std::collections::HashSet;

pub struct NoteService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> NoteService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates the note together with its own `note` node.
    pub fn create_note(&mut self, note: &NewNote) -> RepoResult<Note> {
        let created = with_write_tx(self.conn, |tx| -> RepoResult<Note> {
            let node = SqliteNodeRepository::new(tx).create_node(NodeType::Note)?;
            SqliteNoteRepository::new(tx).create_note(node.id, note)
        })?;
        info!(
            "event=note_create module=service status=ok note_id={} node_id={} page_number={} annotates={}",
            created.id,
            created.node_id,
            created.page_number,
            created.annotates.is_some()
        );
        Ok(created)
    }

    pub fn get_note(&self, id: NoteId) -> RepoResult<Note> {
        SqliteNoteRepository::new(self.conn)
            .get_note(id)?
            .ok_or(RepoError::NotFound(RecordRef::Note(id)))
    }

    /// Fail-fast: the first missing id aborts with `NotFound`.
    pub fn get_notes(&self, ids: &[NoteId]) -> RepoResult<Vec<Note>> {
        SqliteNoteRepository::new(self.conn).get_notes(ids)
    }

    /// Active notes on an existing page.
    pub fn notes_on_page(&self, page_number: i64) -> RepoResult<Vec<Note>> {
        if !SqlitePageRepository::new(self.conn).page_exists(page_number)? {
            return Err(RepoError::NotFound(RecordRef::Page(page_number)));
        }
        SqliteNoteRepository::new(self.conn).notes_on_page(page_number, false)
    }

    /// Resolves a `note` node back to its note.
    pub fn note_for_node(&self, node_id: NodeId) -> RepoResult<Note> {
        SqliteNoteRepository::new(self.conn)
            .note_by_node(node_id)?
            .ok_or(RepoError::NotFound(RecordRef::NoteForNode(node_id)))
    }

    /// Active notes annotating `node_id`.
    pub fn notes_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Note>> {
        SqliteNoteRepository::new(self.conn).notes_for_node(node_id)
    }

    /// Active notes matching any of `terms`. Blank terms are ignored.
    pub fn search_notes<S: AsRef<str>>(&self, terms: &[S]) -> RepoResult<Vec<Note>> {
        let repo = SqliteNoteRepository::new(self.conn);
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for term in terms.iter().map(|term| term.as_ref().trim()) {
            if term.is_empty() {
                continue;
            }
            for note in repo.search_notes(term)? {
                if seen.insert(note.id) {
                    found.push(note);
                }
            }
        }
        found.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(found)
    }

    pub fn update_note_content(&mut self, id: NoteId, content: &str) -> RepoResult<Note> {
        let note = with_write_tx(self.conn, |tx| {
            SqliteNoteRepository::new(tx).update_note_content(id, content)
        })?;
        info!("event=note_update module=service status=ok note_id={id}");
        Ok(note)
    }

    pub fn soft_delete_note(&mut self, id: NoteId) -> RepoResult<Note> {
        let note = with_write_tx(self.conn, |tx| {
            SqliteNoteRepository::new(tx).set_note_deleted(id, true)
        })?;
        info!("event=note_soft_delete module=service status=ok note_id={id}");
        Ok(note)
    }

    pub fn restore_note(&mut self, id: NoteId) -> RepoResult<Note> {
        let note = with_write_tx(self.conn, |tx| {
            SqliteNoteRepository::new(tx).set_note_deleted(id, false)
        })?;
        info!("event=note_restore module=service status=ok note_id={id}");
        Ok(note)
    }

    pub fn set_note_resolved(&mut self, id: NoteId, resolved: bool) -> RepoResult<Note> {
        let note = with_write_tx(self.conn, |tx| {
            SqliteNoteRepository::new(tx).set_note_resolved(id, resolved)
        })?;
        info!("event=note_resolve module=service status=ok note_id={id} resolved={resolved}");
        Ok(note)
    }
}
