//! Command-line tool over a Jawbone database.
//!
//! # Responsibility
//! - Open (and migrate) a database file.
//! - Expose page import, page search and the graph snapshot as JSON on
//!   stdout for quick local checks.

use jawbone_core::{open_db, ErrorPayload, GraphService, LoggingConfig, PageService};
use log::error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "usage:
  jawbone_cli version
  jawbone_cli <db> snapshot
  jawbone_cli <db> import-pages <dir>
  jawbone_cli <db> search-pages <term>...";

fn main() -> ExitCode {
    if let Some(config) = LoggingConfig::from_env() {
        if let Err(err) = jawbone_core::init_logging(&config) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli_run module=cli status=error");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let (db_path, command, rest) = match args {
        [single] if single == "version" => return Ok(jawbone_core::core_version().to_string()),
        [db_path, command, rest @ ..] => (PathBuf::from(db_path), command.as_str(), rest),
        _ => return Err(USAGE.to_string()),
    };

    let mut conn = open_db(&db_path).map_err(|err| format!("cannot open database: {err}"))?;
    match (command, rest) {
        ("snapshot", []) => {
            let snapshot = GraphService::new(&mut conn)
                .snapshot()
                .map_err(|err| to_json(&err.to_payload()))?;
            serde_json::to_string_pretty(&snapshot).map_err(|err| err.to_string())
        }
        ("import-pages", [dir]) => {
            let pages = PageService::new(&mut conn)
                .import_pages_from_dir(Path::new(dir))
                .map_err(|err| err.to_string())?;
            Ok(serde_json::json!({ "imported": pages }).to_string())
        }
        ("search-pages", terms) if !terms.is_empty() => {
            let pages = PageService::new(&mut conn)
                .search_pages(terms)
                .map_err(|err| to_json(&err.to_payload()))?;
            Ok(serde_json::json!({ "pages": pages }).to_string())
        }
        _ => Err(USAGE.to_string()),
    }
}

fn to_json(payload: &ErrorPayload) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| payload.message.clone())
}
