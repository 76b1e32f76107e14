//! SQLite storage bootstrap, migrations and the write unit of work.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the graph core.
//! - Apply schema migrations in deterministic order.
//! - Scope every multi-row write in exactly one transaction.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write graph data before migrations succeed.
//! - Repositories never open transactions; callers hand them a `Transaction`
//!   (which derefs to `Connection`) obtained from [`with_write_tx`].

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Runs `op` inside one `BEGIN IMMEDIATE` transaction.
///
/// The transaction commits only when `op` returns `Ok`. Any error (or panic)
/// drops the transaction, which rolls back every write made through it, so
/// callers never observe half of a node/entity pair or relationship pair.
pub fn with_write_tx<T, E>(
    conn: &mut Connection,
    op: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = op(&tx)?;
    tx.commit()?;
    Ok(value)
}
