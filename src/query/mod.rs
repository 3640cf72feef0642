// Faceted query builder
//
// Combination rules:
// - genres and directors match when the stored (encoded) string contains any selected
//   value as a substring, so "Action" also matches "Action|Comedy" and legacy
//   "Action, Comedy";
// - years match exactly;
// - categories are ANDed, and an empty category adds no condition.

pub mod facets;

use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::db::schema::{escape_like, record_from_row, VideoRecord, RECORD_COLUMNS};
use crate::error::Result;

pub use facets::FacetIndex;

/// Values selected in each facet. An empty list leaves that facet unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFilter {
    pub genres: Vec<String>,
    pub years: Vec<String>,
    pub directors: Vec<String>,
}

/// WHERE clause (without the keyword) and its positional parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterClause {
    pub sql: String,
    pub params: Vec<String>,
}

impl VideoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.years = years.into_iter().map(Into::into).collect();
        self
    }

    pub fn directors<I, S>(mut self, directors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directors = directors.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.years.is_empty() && self.directors.is_empty()
    }

    /// Build the predicate. `None` when no facet has a selection.
    pub fn to_clause(&self) -> Option<FilterClause> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if !self.genres.is_empty() {
            conditions.push(any_contains("genres", self.genres.len()));
            params.extend(self.genres.iter().map(|g| contains_pattern(g)));
        }

        if !self.years.is_empty() {
            let placeholders = vec!["?"; self.years.len()].join(", ");
            conditions.push(format!("year IN ({})", placeholders));
            params.extend(self.years.iter().cloned());
        }

        if !self.directors.is_empty() {
            conditions.push(any_contains("directors", self.directors.len()));
            params.extend(self.directors.iter().map(|d| contains_pattern(d)));
        }

        if conditions.is_empty() {
            return None;
        }

        Some(FilterClause {
            sql: conditions.join(" AND "),
            params,
        })
    }
}

fn any_contains(column: &str, count: usize) -> String {
    let alternatives = vec![format!("{} LIKE ? ESCAPE '\\'", column); count];
    format!("({})", alternatives.join(" OR "))
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

/// Run a filtered query, ordered by path, returning at most `limit` rows.
pub fn query_videos(conn: &Connection, filter: &VideoFilter, limit: i64) -> Result<Vec<VideoRecord>> {
    let clause = filter.to_clause().unwrap_or_default();
    let where_sql = if clause.sql.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clause.sql)
    };

    let sql = format!(
        "SELECT {} FROM videos{} ORDER BY path LIMIT {}",
        RECORD_COLUMNS,
        where_sql,
        limit.max(0)
    );
    log::debug!("query: {} {:?}", sql, clause.params);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(clause.params.iter()), |row| {
        record_from_row(row, 0)
    })?;

    let mut videos = Vec::new();
    for row in rows {
        videos.push(row?);
    }
    Ok(videos)
}

/// Paths matched by a filter, in result order.
pub fn query_paths(conn: &Connection, filter: &VideoFilter, limit: i64) -> Result<Vec<String>> {
    Ok(query_videos(conn, filter, limit)?
        .into_iter()
        .map(|v| v.path)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_QUERY_LIMIT;
    use crate::db::open_in_memory;
    use crate::db::schema::upsert_video;

    fn video(path: &str, genres: &str, year: &str, directors: &str) -> VideoRecord {
        VideoRecord {
            path: path.to_string(),
            genres: genres.to_string(),
            year: year.to_string(),
            directors: directors.to_string(),
            ..VideoRecord::default()
        }
    }

    fn setup_db() -> Connection {
        let conn = open_in_memory().unwrap();
        for v in [
            video("/lib/d.mkv", "Action|Thriller", "2020", "Kathryn Bigelow"),
            video("/lib/a.mp4", "Action|Comedy", "2001", "Edgar Wright"),
            video("/lib/c.avi", "Drama", "2001", "Kathryn Bigelow"),
            video("/lib/b.mov", "Action, Sci-Fi", "1999", "Wachowski, Lana|Wachowski, Lilly"),
            video("/lib/e.mp4", "", "", ""),
        ] {
            upsert_video(&conn, &v).unwrap();
        }
        conn
    }

    #[test]
    fn test_empty_filter_matches_everything_in_path_order() {
        let conn = setup_db();
        let paths = query_paths(&conn, &VideoFilter::new(), DEFAULT_QUERY_LIMIT).unwrap();
        assert_eq!(paths, vec!["/lib/a.mp4", "/lib/b.mov", "/lib/c.avi", "/lib/d.mkv", "/lib/e.mp4"]);
        assert!(VideoFilter::new().to_clause().is_none());
    }

    #[test]
    fn test_genre_and_years_are_anded() {
        let conn = setup_db();
        let filter = VideoFilter::new().genres(["Action"]).years(["2001", "2020"]);
        let paths = query_paths(&conn, &filter, DEFAULT_QUERY_LIMIT).unwrap();
        assert_eq!(paths, vec!["/lib/a.mp4", "/lib/d.mkv"]);
    }

    #[test]
    fn test_values_within_a_facet_are_ored() {
        let conn = setup_db();
        let filter = VideoFilter::new().genres(["Comedy", "Drama"]);
        let paths = query_paths(&conn, &filter, DEFAULT_QUERY_LIMIT).unwrap();
        assert_eq!(paths, vec!["/lib/a.mp4", "/lib/c.avi"]);
    }

    #[test]
    fn test_genre_match_is_substring_of_encoded_field() {
        let conn = setup_db();
        // Legacy comma encoding still matches
        let paths = query_paths(&conn, &VideoFilter::new().genres(["Sci-Fi"]), DEFAULT_QUERY_LIMIT).unwrap();
        assert_eq!(paths, vec!["/lib/b.mov"]);

        // Partial text matches too
        let paths = query_paths(&conn, &VideoFilter::new().genres(["Thrill"]), DEFAULT_QUERY_LIMIT).unwrap();
        assert_eq!(paths, vec!["/lib/d.mkv"]);
    }

    #[test]
    fn test_year_match_is_exact() {
        let conn = setup_db();
        let paths = query_paths(&conn, &VideoFilter::new().years(["200"]), DEFAULT_QUERY_LIMIT).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_director_filter() {
        let conn = setup_db();
        let filter = VideoFilter::new().directors(["Bigelow"]).years(["2001"]);
        let paths = query_paths(&conn, &filter, DEFAULT_QUERY_LIMIT).unwrap();
        assert_eq!(paths, vec!["/lib/c.avi"]);

        let filter = VideoFilter::new().directors(["Wachowski, Lilly"]);
        assert_eq!(query_paths(&conn, &filter, DEFAULT_QUERY_LIMIT).unwrap(), vec!["/lib/b.mov"]);
    }

    #[test]
    fn test_limit_is_applied_after_ordering() {
        let conn = setup_db();
        let paths = query_paths(&conn, &VideoFilter::new(), 2).unwrap();
        assert_eq!(paths, vec!["/lib/a.mp4", "/lib/b.mov"]);
        assert!(query_paths(&conn, &VideoFilter::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_wildcards_in_selection_are_literal() {
        let conn = setup_db();
        let paths = query_paths(&conn, &VideoFilter::new().genres(["%"]), DEFAULT_QUERY_LIMIT).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_clause_shape() {
        let clause = VideoFilter::new()
            .genres(["Action", "Drama"])
            .years(["1999"])
            .to_clause()
            .unwrap();
        assert_eq!(
            clause.sql,
            "(genres LIKE ? ESCAPE '\\' OR genres LIKE ? ESCAPE '\\') AND year IN (?)"
        );
        assert_eq!(clause.params, vec!["%Action%", "%Drama%", "1999"]);
    }
}
