// vidcat constants
// Values here are part of the on-disk and sidecar contract. Changing them changes how
// existing catalogs are read.

// Scan
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "avi", "mov", "wmv", "flv"];
pub const SIDECAR_EXTENSION: &str = "nfo";

// Multi-valued fields (genres, directors, actors)
pub const MULTI_VALUE_SEPARATOR: char = '|';
pub const LEGACY_SEPARATOR: char = ',';

// Store
pub const DB_FILENAME: &str = "videos.db";
pub const DB_PATH_ENV: &str = "VIDCAT_DB";
pub const APP_QUALIFIER: &str = "org";
pub const APP_ORGANIZATION: &str = "vidcat";
pub const APP_NAME: &str = "vidcat";

// Queries
pub const DEFAULT_QUERY_LIMIT: i64 = 10_000;

// Playlists
pub const PLAYLIST_HEADER: &str = "#EXTM3U";
pub const PLAYLIST_EXTENSION: &str = "m3u";
pub const PLAYLIST_PREFIX: &str = "random_playlist_";
pub const DEFAULT_PLAYLIST_SIZE: usize = 5;
