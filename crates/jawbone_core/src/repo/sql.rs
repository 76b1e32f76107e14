//! Row decoding and small query helpers shared by the SQLite repositories.

use crate::model::entity::EntityType;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{Connection, Params, Row};
use uuid::Uuid;

/// Entity attribute table backing one variant.
pub(crate) fn entity_table(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Person => "people",
        EntityType::Location => "locations",
        EntityType::Event => "events",
        EntityType::Tag => "tags",
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn uuid_column(row: &Row<'_>, column: &'static str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    parse_uuid(&text, column)
}

pub(crate) fn optional_uuid_column(row: &Row<'_>, column: &'static str) -> RepoResult<Option<Uuid>> {
    row.get::<_, Option<String>>(column)?
        .map(|value| parse_uuid(&value, column))
        .transpose()
}

pub(crate) fn flag_column(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Evaluates `SELECT EXISTS(...)`-style queries returning 0/1.
pub(crate) fn exists(conn: &Connection, sql: &str, params: impl Params) -> RepoResult<bool> {
    let value: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(value == 1)
}

/// `?, ?, ?` for an `IN (...)` list of `count` values.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn placeholders_match_count() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
