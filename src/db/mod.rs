// Database module

pub mod migrations;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::constants::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, DB_FILENAME, DB_PATH_ENV};
use crate::error::Result;

/// Open or create a catalog at the given path.
/// The returned connection is the only handle the process should hold; it is closed
/// when dropped.
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    migrations::ensure_schema(&conn)?;

    log::debug!("Opened catalog {}", db_path.display());
    Ok(conn)
}

/// Open a throwaway catalog held in memory.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::ensure_schema(&conn)?;
    Ok(conn)
}

/// Resolve where the catalog lives.
/// Precedence: explicit path, then `VIDCAT_DB`, then the platform data directory,
/// then the working directory.
pub fn resolve_db_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    if let Ok(v) = std::env::var(DB_PATH_ENV) {
        if !v.trim().is_empty() {
            return PathBuf::from(v);
        }
    }

    default_db_path()
}

/// Platform data directory location, e.g. `~/.local/share/vidcat/videos.db` on Linux.
pub fn default_db_path() -> PathBuf {
    match directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME) {
        Some(dirs) => dirs.data_dir().join(DB_FILENAME),
        None => PathBuf::from(DB_FILENAME),
    }
}
