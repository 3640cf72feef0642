// M3U playlist export
// A header line followed by one literal media path per line.

use std::io::Write;
use std::path::{Path, PathBuf};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{PLAYLIST_EXTENSION, PLAYLIST_HEADER, PLAYLIST_PREFIX};
use crate::error::Result;

/// Pick `min(count, paths.len())` distinct paths uniformly at random.
pub fn sample_paths<R: Rng + ?Sized>(paths: &[String], count: usize, rng: &mut R) -> Vec<String> {
    paths
        .choose_multiple(rng, count.min(paths.len()))
        .cloned()
        .collect()
}

/// Write an extended M3U playlist (UTF-8, `\n` line endings).
pub fn write_m3u(dest: &Path, paths: &[String]) -> Result<()> {
    let file = std::fs::File::create(dest)?;
    let mut out = std::io::BufWriter::new(file);

    writeln!(out, "{}", PLAYLIST_HEADER)?;
    for path in paths {
        writeln!(out, "{}", path)?;
    }
    out.flush()?;

    log::info!("Wrote playlist {} ({} entries)", dest.display(), paths.len());
    Ok(())
}

/// `<dir>/random_playlist_<unix-seconds>.m3u`
pub fn default_playlist_path(dir: &Path, now: chrono::DateTime<chrono::Utc>) -> PathBuf {
    dir.join(format!("{}{}.{}", PLAYLIST_PREFIX, now.timestamp(), PLAYLIST_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn paths(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/videos/{}.mp4", i)).collect()
    }

    #[test]
    fn test_sample_is_distinct_subset() {
        let all = paths(20);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let picked = sample_paths(&all, 5, &mut rng);

        assert_eq!(picked.len(), 5);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(picked.iter().all(|p| all.contains(p)));
    }

    #[test]
    fn test_sample_caps_at_available() {
        let all = paths(3);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert_eq!(sample_paths(&all, 10, &mut rng).len(), 3);
        assert!(sample_paths(&[], 4, &mut rng).is_empty());
    }

    #[test]
    fn test_write_m3u_format() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("list.m3u");
        write_m3u(&dest, &["/a b/one.mkv".to_string(), "C:\\films\\two.mp4".to_string()]).unwrap();

        let content = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(content, "#EXTM3U\n/a b/one.mkv\nC:\\films\\two.mp4\n");
    }

    #[test]
    fn test_default_playlist_path() {
        let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            default_playlist_path(Path::new("/home/me"), now),
            PathBuf::from("/home/me/random_playlist_1700000000.m3u")
        );
    }
}
