//! Note model: free text attached to a page, represented in the graph by
//! its own `note` node.
//!
//! # Invariants
//! - A highlight range is either fully absent or satisfies `start < end`.
//! - Every note owns exactly one node of type `note`.
//! - Notes have their own soft-delete flag and never touch node lifecycle.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a note.
pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub page_number: i64,
    /// The note's own `note` node; link it to cross-reference the note.
    pub node_id: NodeId,
    /// Node the note comments on, if any.
    pub annotates: Option<NodeId>,
    /// Quoted/selected source text.
    pub note_text: String,
    /// Annotator's commentary.
    pub content: String,
    pub text_start: Option<i64>,
    pub text_end: Option<i64>,
    pub deleted: bool,
    pub resolved: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input for a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub page_number: i64,
    pub note_text: String,
    pub content: String,
    pub text_start: Option<i64>,
    pub text_end: Option<i64>,
    pub annotates: Option<NodeId>,
}

impl NewNote {
    pub fn new(page_number: i64, note_text: impl Into<String>) -> Self {
        Self {
            page_number,
            note_text: note_text.into(),
            ..Self::default()
        }
    }

    /// Highlight range to persist; incomplete or inverted ranges are dropped.
    pub fn text_range(&self) -> (Option<i64>, Option<i64>) {
        match (self.text_start, self.text_end) {
            (Some(start), Some(end)) if start < end => (Some(start), Some(end)),
            _ => (None, None),
        }
    }
}
