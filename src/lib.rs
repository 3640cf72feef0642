// vidcat - library entry point
// Catalog of a video folder built from .nfo sidecars, with faceted filtering.

pub mod constants;
pub mod error;
pub mod db;
pub mod metadata;
pub mod scan;
pub mod query;
pub mod export;

pub use db::schema::{MatchField, MatchMode, SortColumn, VideoRecord, VideoRow};
pub use error::{CatalogError, Result};
pub use query::{FacetIndex, VideoFilter};
pub use scan::{ScanProgress, ScanReport};
