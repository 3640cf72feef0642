// Database schema types and query helpers

use std::fmt;
use std::str::FromStr;

use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::metadata::{decode_multi, NfoMetadata};

/// Column list shared by every record SELECT, in export order.
pub(crate) const RECORD_COLUMNS: &str =
    "path, genres, year, directors, plot, actors, duration, rating, poster, mtime";

/// SQLite caps bound parameters per statement; stay well below the oldest limit (999).
const DELETE_CHUNK_SIZE: usize = 500;

// ----- Video -----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub path: String,
    pub genres: String,
    pub year: String,
    pub directors: String,
    pub plot: String,
    pub actors: String,
    pub duration: String,
    pub rating: String,
    pub poster: String,
    /// Seconds since the Unix epoch
    pub mtime: Option<f64>,
}

impl VideoRecord {
    /// A record with no metadata, as stored for a video without a sidecar.
    pub fn bare(path: impl Into<String>, mtime: Option<f64>) -> Self {
        Self {
            path: path.into(),
            mtime,
            ..Self::default()
        }
    }

    pub fn from_metadata(path: impl Into<String>, mtime: Option<f64>, meta: NfoMetadata) -> Self {
        Self {
            path: path.into(),
            genres: meta.genres,
            year: meta.year,
            directors: meta.directors,
            plot: meta.plot,
            actors: meta.actors,
            duration: meta.duration,
            rating: meta.rating,
            poster: meta.poster,
            mtime,
        }
    }

    pub fn genre_list(&self) -> Vec<String> {
        decode_multi(&self.genres)
    }

    pub fn director_list(&self) -> Vec<String> {
        decode_multi(&self.directors)
    }

    pub fn actor_list(&self) -> Vec<String> {
        decode_multi(&self.actors)
    }
}

/// A stored record together with its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRow {
    pub id: i64,
    #[serde(flatten)]
    pub record: VideoRecord,
}

/// Map `RECORD_COLUMNS` starting at `offset`. Columns written by older versions may
/// be NULL; they read back as empty strings.
pub(crate) fn record_from_row(row: &Row, offset: usize) -> rusqlite::Result<VideoRecord> {
    let text = |i: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(offset + i)?.unwrap_or_default())
    };

    Ok(VideoRecord {
        path: text(0)?,
        genres: text(1)?,
        year: text(2)?,
        directors: text(3)?,
        plot: text(4)?,
        actors: text(5)?,
        duration: text(6)?,
        rating: text(7)?,
        poster: text(8)?,
        mtime: mtime_from_value(row.get_ref(offset + 9)?),
    })
}

fn mtime_from_value(value: ValueRef) -> Option<f64> {
    match value {
        ValueRef::Real(f) => Some(f),
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(|s| s.trim().parse().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Insert a record, or overwrite every field of the existing row with the same path.
/// The row id is kept across overwrites.
pub fn upsert_video(conn: &Connection, video: &VideoRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO videos (path, mtime, genres, year, directors, plot, actors, duration, rating, poster)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(path) DO UPDATE SET
            mtime = excluded.mtime,
            genres = excluded.genres,
            year = excluded.year,
            directors = excluded.directors,
            plot = excluded.plot,
            actors = excluded.actors,
            duration = excluded.duration,
            rating = excluded.rating,
            poster = excluded.poster",
        params![
            video.path,
            video.mtime,
            video.genres,
            video.year,
            video.directors,
            video.plot,
            video.actors,
            video.duration,
            video.rating,
            video.poster,
        ],
    )?;
    Ok(())
}

pub fn get_video_by_path(conn: &Connection, path: &str) -> Result<Option<VideoRow>> {
    let sql = format!("SELECT id, {} FROM videos WHERE path = ?1", RECORD_COLUMNS);
    let result = conn.query_row(&sql, params![path], |row| {
        Ok(VideoRow {
            id: row.get(0)?,
            record: record_from_row(row, 1)?,
        })
    }).optional()?;
    Ok(result)
}

/// Look up records for a list of paths, keeping the input order.
/// Paths that are not in the catalog come back as bare records.
pub fn get_videos_by_paths(conn: &Connection, paths: &[String]) -> Result<Vec<VideoRecord>> {
    let sql = format!("SELECT {} FROM videos WHERE path = ?1", RECORD_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let found = stmt
            .query_row(params![path], |row| record_from_row(row, 0))
            .optional()?;
        records.push(found.unwrap_or_else(|| VideoRecord::bare(path.clone(), None)));
    }
    Ok(records)
}

pub fn count_videos(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
    Ok(count)
}

// ----- Listing -----

/// Columns the full listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Id,
    #[default]
    Path,
    Year,
    Mtime,
    Rating,
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::Id,
        SortColumn::Path,
        SortColumn::Year,
        SortColumn::Mtime,
        SortColumn::Rating,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Path => "path",
            SortColumn::Year => "year",
            SortColumn::Mtime => "mtime",
            SortColumn::Rating => "rating",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortColumn {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        SortColumn::ALL
            .into_iter()
            .find(|c| c.column() == s)
            .ok_or_else(|| CatalogError::InvalidField(s.to_string()))
    }
}

/// Every stored row, with ids, ordered by the given column.
pub fn fetch_all(conn: &Connection, order_by: SortColumn) -> Result<Vec<VideoRow>> {
    let sql = format!(
        "SELECT id, {} FROM videos ORDER BY {}",
        RECORD_COLUMNS,
        order_by.column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(VideoRow {
            id: row.get(0)?,
            record: record_from_row(row, 1)?,
        })
    })?;

    let mut videos = Vec::new();
    for row in rows {
        videos.push(row?);
    }
    Ok(videos)
}

// ----- Facets -----

fn non_empty_values(conn: &Connection, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT {col} FROM videos WHERE {col} IS NOT NULL AND {col} != ''",
        col = column
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}

/// Decode every value, union the tokens, sort case-insensitively.
/// Tokens differing only by case are reported once.
fn union_tokens(raw_values: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = raw_values
        .iter()
        .flat_map(|raw| decode_multi(raw))
        .collect();

    tokens.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    tokens.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
    tokens
}

/// Newest first. Numeric when every year parses as an integer, lexical otherwise.
fn sort_years(mut years: Vec<String>) -> Vec<String> {
    years.sort();
    years.dedup();

    if years.iter().all(|y| y.trim().parse::<i64>().is_ok()) {
        years.sort_by_key(|y| std::cmp::Reverse(y.trim().parse::<i64>().unwrap_or(0)));
    } else {
        years.reverse();
    }
    years
}

pub fn list_distinct_genres(conn: &Connection) -> Result<Vec<String>> {
    Ok(union_tokens(&non_empty_values(conn, "genres")?))
}

pub fn list_distinct_directors(conn: &Connection) -> Result<Vec<String>> {
    Ok(union_tokens(&non_empty_values(conn, "directors")?))
}

pub fn list_distinct_years(conn: &Connection) -> Result<Vec<String>> {
    Ok(sort_years(non_empty_values(conn, "year")?))
}

// ----- Bulk maintenance -----

/// Fields bulk deletion may match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Path,
    Genres,
    Year,
    Directors,
    Actors,
    Duration,
    Rating,
    Poster,
}

impl MatchField {
    pub const ALL: [MatchField; 8] = [
        MatchField::Path,
        MatchField::Genres,
        MatchField::Year,
        MatchField::Directors,
        MatchField::Actors,
        MatchField::Duration,
        MatchField::Rating,
        MatchField::Poster,
    ];

    pub fn column(self) -> &'static str {
        match self {
            MatchField::Path => "path",
            MatchField::Genres => "genres",
            MatchField::Year => "year",
            MatchField::Directors => "directors",
            MatchField::Actors => "actors",
            MatchField::Duration => "duration",
            MatchField::Rating => "rating",
            MatchField::Poster => "poster",
        }
    }
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for MatchField {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        MatchField::ALL
            .into_iter()
            .find(|f| f.column() == s)
            .ok_or_else(|| CatalogError::InvalidField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Field equals the pattern
    Exact,
    /// Field contains the pattern (ASCII case-insensitive)
    Contains,
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Delete rows by id. Ids that do not exist are ignored.
pub fn delete_ids(conn: &Connection, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    let mut removed = 0;
    for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(",");
        let sql = format!("DELETE FROM videos WHERE id IN ({})", placeholders);
        removed += tx.execute(&sql, params_from_iter(chunk.iter()))?;
    }
    tx.commit()?;

    Ok(removed)
}

/// Delete rows whose field equals or contains `pattern`.
pub fn delete_by_field_match(
    conn: &Connection,
    field: MatchField,
    pattern: &str,
    mode: MatchMode,
) -> Result<usize> {
    let removed = match mode {
        MatchMode::Exact => {
            let sql = format!("DELETE FROM videos WHERE {} = ?1", field.column());
            conn.execute(&sql, params![pattern])?
        }
        MatchMode::Contains => {
            if pattern.is_empty() {
                return Err(CatalogError::Other(
                    "An empty substring would match every row".to_string(),
                ));
            }
            let sql = format!("DELETE FROM videos WHERE {} LIKE ?1 ESCAPE '\\'", field.column());
            conn.execute(&sql, params![format!("%{}%", escape_like(pattern))])?
        }
    };
    Ok(removed)
}

/// Text boundary for `delete_by_field_match`: the field name is validated before
/// anything is deleted.
pub fn delete_by_field_name(
    conn: &Connection,
    field: &str,
    pattern: &str,
    mode: MatchMode,
) -> Result<usize> {
    let field = MatchField::from_str(field)?;
    delete_by_field_match(conn, field, pattern, mode)
}

/// Reclaim space left by deleted rows.
pub fn vacuum(conn: &Connection) -> Result<()> {
    conn.execute_batch("VACUUM")?;
    Ok(())
}
