//! Page use-case service: page text storage, search and bulk import.
//!
//! # Invariants
//! - Import reads only files named `page_<N>.txt`; other entries are skipped.
//! - The file chosen for a page number does not depend on directory order.
//! - One import is one transaction: either every page is written or none.

use crate::db::with_write_tx;
use crate::model::page::Page;
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::page_repo::SqlitePageRepository;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static PAGE_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page_(\d+)\.txt$").expect("valid page file regex"));

/// Failure while importing pages from a directory.
#[derive(Debug)]
pub enum PageImportError {
    /// Directory listing or file read failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Repo(RepoError),
}

impl Display for PageImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PageImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for PageImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for PageImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub struct PageService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> PageService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn upsert_page(&mut self, page_number: i64, content: &str) -> RepoResult<Page> {
        let page = with_write_tx(self.conn, |tx| {
            SqlitePageRepository::new(tx).upsert_page(page_number, content)
        })?;
        info!(
            "event=page_upsert module=service status=ok page_number={page_number} content_len={}",
            content.len()
        );
        Ok(page)
    }

    pub fn get_page(&self, page_number: i64) -> RepoResult<Page> {
        SqlitePageRepository::new(self.conn)
            .get_page(page_number)?
            .ok_or(RepoError::NotFound(RecordRef::Page(page_number)))
    }

    pub fn update_page_content(&mut self, page_number: i64, content: &str) -> RepoResult<Page> {
        let page = with_write_tx(self.conn, |tx| {
            SqlitePageRepository::new(tx).update_page_content(page_number, content)
        })?;
        info!(
            "event=page_update module=service status=ok page_number={page_number} content_len={}",
            content.len()
        );
        Ok(page)
    }

    /// Page numbers matching any of `terms`, ascending. Blank terms are ignored.
    pub fn search_pages<S: AsRef<str>>(&self, terms: &[S]) -> RepoResult<Vec<i64>> {
        let repo = SqlitePageRepository::new(self.conn);
        let mut found = BTreeSet::new();
        for term in terms.iter().map(|term| term.as_ref().trim()) {
            if term.is_empty() {
                continue;
            }
            found.extend(repo.search_pages(term)?);
        }
        Ok(found.into_iter().collect())
    }

    /// Upserts every `page_<N>.txt` file in `dir`. Returns the imported
    /// page numbers in ascending order.
    pub fn import_pages_from_dir(&mut self, dir: &Path) -> Result<Vec<i64>, PageImportError> {
        let files = collect_page_files(dir)?;
        let mut pages = Vec::with_capacity(files.len());
        for (page_number, path) in files {
            let content = std::fs::read_to_string(&path)
                .map_err(|source| PageImportError::Io { path, source })?;
            pages.push((page_number, content));
        }

        let imported = with_write_tx(self.conn, |tx| -> Result<Vec<i64>, PageImportError> {
            let repo = SqlitePageRepository::new(tx);
            for (page_number, content) in &pages {
                repo.upsert_page(*page_number, content)?;
            }
            Ok(pages.iter().map(|(page_number, _)| *page_number).collect())
        })?;

        info!(
            "event=page_import module=service status=ok dir={} pages={}",
            dir.display(),
            imported.len()
        );
        Ok(imported)
    }
}

/// Page files in `dir` keyed by page number. When two names map to the
/// same number (`page_1.txt`, `page_01.txt`) the lexically smaller path wins.
fn collect_page_files(dir: &Path) -> Result<Vec<(i64, PathBuf)>, PageImportError> {
    let io_error = |source| PageImportError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        match parse_page_file_name(name) {
            Some(page_number) if path.is_file() => files.push((page_number, path)),
            Some(_) => {}
            None if PAGE_FILE_RE.is_match(name) => {
                warn!("event=page_import module=service status=skip reason=page_number_out_of_range file={name}");
            }
            None => {}
        }
    }
    files.sort();
    files.dedup_by(|(page_number, skipped), (kept_number, kept)| {
        if page_number != kept_number {
            return false;
        }
        warn!(
            "event=page_import module=service status=skip reason=duplicate_page_number page_number={page_number} kept={} skipped={}",
            kept.display(),
            skipped.display()
        );
        true
    });
    Ok(files)
}

fn parse_page_file_name(name: &str) -> Option<i64> {
    PAGE_FILE_RE
        .captures(name)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}
