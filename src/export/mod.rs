// Export module
// File outputs built from query results: CSV tables and M3U playlists.

pub mod csv_export;
pub mod playlist;

pub use csv_export::{write_management_csv, write_query_csv};
pub use playlist::{default_playlist_path, sample_paths, write_m3u};
