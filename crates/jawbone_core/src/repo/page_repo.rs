//! Page repository: keyed text store for source pages.
//!
//! # Invariants
//! - Pages are keyed by their page number; upsert never duplicates a page.
//! - Substring search is case-insensitive (ASCII) and ordered by page number.

use crate::model::page::Page;
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::sql::exists;
use rusqlite::{params, Connection, Row};

const PAGE_SELECT_SQL: &str = "SELECT page_number, content, updated_at FROM pages";

pub struct SqlitePageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePageRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_page(&self, page_number: i64) -> RepoResult<Page> {
        self.get_page(page_number)?
            .ok_or(RepoError::NotFound(RecordRef::Page(page_number)))
    }

    /// Inserts the page or replaces its content.
    pub fn upsert_page(&self, page_number: i64, content: &str) -> RepoResult<Page> {
        self.conn.execute(
            "INSERT INTO pages (page_number, content)
             VALUES (?1, ?2)
             ON CONFLICT(page_number) DO UPDATE SET
                content = excluded.content,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![page_number, content],
        )?;
        self.require_page(page_number)
    }

    pub fn get_page(&self, page_number: i64) -> RepoResult<Option<Page>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PAGE_SELECT_SQL} WHERE page_number = ?1;"))?;
        let mut rows = stmt.query([page_number])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_page_row(row)?));
        }
        Ok(None)
    }

    /// Replaces content of an existing page.
    pub fn update_page_content(&self, page_number: i64, content: &str) -> RepoResult<Page> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET content = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE page_number = ?1;",
            params![page_number, content],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Page(page_number)));
        }
        self.require_page(page_number)
    }

    /// Page numbers whose content contains `term`.
    pub fn search_pages(&self, term: &str) -> RepoResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_number
             FROM pages
             WHERE instr(lower(content), lower(?1)) > 0
             ORDER BY page_number ASC;",
        )?;
        let mut rows = stmt.query([term])?;
        let mut numbers = Vec::new();
        while let Some(row) = rows.next()? {
            numbers.push(row.get(0)?);
        }
        Ok(numbers)
    }

    pub fn page_exists(&self, page_number: i64) -> RepoResult<bool> {
        exists(
            self.conn,
            "SELECT EXISTS(SELECT 1 FROM pages WHERE page_number = ?1);",
            [page_number],
        )
    }
}

fn parse_page_row(row: &Row<'_>) -> RepoResult<Page> {
    Ok(Page {
        page_number: row.get("page_number")?,
        content: row.get("content")?,
        updated_at: row.get("updated_at")?,
    })
}
