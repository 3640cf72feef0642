// File discovery for scans

use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::constants::{SIDECAR_EXTENSION, VIDEO_EXTENSIONS};
use crate::error::{CatalogError, Result};

/// Discover all video files under a directory.
/// Returned paths are absolute and sorted for consistent ordering.
pub fn discover_video_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(CatalogError::InvalidPath(format!(
            "Not a directory: {}",
            root.display()
        )));
    }
    let root = root.canonicalize()?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if path.is_file() && is_video_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Locate the sidecar for a video: same path with the extension replaced by `.nfo`
/// (or `.NFO`).
pub fn find_sidecar(video_path: &Path) -> Option<PathBuf> {
    let lower = video_path.with_extension(SIDECAR_EXTENSION);
    if lower.is_file() {
        return Some(lower);
    }

    let upper = video_path.with_extension(SIDECAR_EXTENSION.to_uppercase());
    if upper.is_file() {
        return Some(upper);
    }

    None
}

/// Check if a file is a video based on extension (case-insensitive)
pub fn is_video_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return false,
    };

    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("movie.mp4")));
        assert!(is_video_file(Path::new("movie.MKV")));
        assert!(is_video_file(Path::new("/a/b/clip.Flv")));
        assert!(!is_video_file(Path::new("movie.nfo")));
        assert!(!is_video_file(Path::new("movie.webm")));
        assert!(!is_video_file(Path::new("mp4")));
    }

    #[test]
    fn test_discover_recurses_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("b/deeper")).unwrap();
        std::fs::create_dir_all(root.join("a")).unwrap();
        for name in ["b/deeper/z.wmv", "a/one.MOV", "top.avi", "notes.txt", "a/one.nfo"] {
            std::fs::write(root.join(name), b"x").unwrap();
        }

        let files = discover_video_files(root).unwrap();
        let canonical = root.canonicalize().unwrap();
        assert_eq!(
            files,
            vec![
                canonical.join("a/one.MOV"),
                canonical.join("b/deeper/z.wmv"),
                canonical.join("top.avi"),
            ]
        );
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_discover_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = discover_video_files(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPath(_)));
    }

    #[test]
    fn test_find_sidecar() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("film.mkv");
        std::fs::write(&video, b"x").unwrap();
        assert!(find_sidecar(&video).is_none());

        std::fs::write(tmp.path().join("film.nfo"), b"<movie/>").unwrap();
        assert_eq!(find_sidecar(&video), Some(tmp.path().join("film.nfo")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_find_sidecar_upper_case_extension() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("film.avi");
        std::fs::write(&video, b"x").unwrap();
        std::fs::write(tmp.path().join("film.NFO"), b"<movie/>").unwrap();
        assert_eq!(find_sidecar(&video), Some(tmp.path().join("film.NFO")));

        // Lower case wins when both exist
        std::fs::write(tmp.path().join("film.nfo"), b"<movie/>").unwrap();
        assert_eq!(find_sidecar(&video), Some(tmp.path().join("film.nfo")));
    }

    #[test]
    fn test_find_sidecar_with_dotted_name() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("The.Movie.2001.mp4");
        std::fs::write(&video, b"x").unwrap();
        std::fs::write(tmp.path().join("The.Movie.2001.nfo"), b"<movie/>").unwrap();
        assert_eq!(find_sidecar(&video), Some(tmp.path().join("The.Movie.2001.nfo")));
    }
}
