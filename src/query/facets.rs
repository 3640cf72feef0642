// Facet index: the filter choices currently present in the catalog

use rusqlite::Connection;
use serde::Serialize;

use crate::db::schema::{list_distinct_directors, list_distinct_genres, list_distinct_years};
use crate::error::Result;

/// Snapshot of distinct facet values. Recompute after a scan or a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetIndex {
    /// Case-insensitive ascending
    pub genres: Vec<String>,
    /// Newest first
    pub years: Vec<String>,
    /// Case-insensitive ascending
    pub directors: Vec<String>,
}

impl FacetIndex {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            genres: list_distinct_genres(conn)?,
            years: list_distinct_years(conn)?,
            directors: list_distinct_directors(conn)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.years.is_empty() && self.directors.is_empty()
    }
}
