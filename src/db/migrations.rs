// Database schema setup
// Create-if-absent only. An existing videos table is used as-is, which keeps catalogs
// written by earlier versions readable.

use rusqlite::Connection;
use crate::error::Result;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS videos (
        id INTEGER PRIMARY KEY,
        path TEXT UNIQUE,
        mtime REAL,
        genres TEXT,
        year TEXT,
        directors TEXT,
        plot TEXT,
        actors TEXT,
        duration TEXT,
        rating TEXT,
        poster TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_videos_path ON videos(path);
    CREATE INDEX IF NOT EXISTS idx_videos_year ON videos(year);
    CREATE INDEX IF NOT EXISTS idx_videos_directors ON videos(directors);
"#;

/// Create the videos table and its indexes when missing.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
