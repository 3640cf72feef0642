// Scan pipeline module
// Walks a folder, reads each video's .nfo sidecar and upserts one row per video.
// Every scan revisits every file and overwrites its row; nothing is skipped on mtime.

pub mod discover;
pub mod progress;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::schema::{upsert_video, VideoRecord};
use crate::error::{CatalogError, Result};
use crate::metadata::parse_nfo;

pub use progress::ScanProgress;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub total_files: usize,
    pub indexed: usize,
    pub failed: usize,
    pub with_sidecar: usize,
    pub sidecar_errors: usize,
    /// Stopped early; rows committed before the stop are kept.
    pub cancelled: bool,
}

impl ScanReport {
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.failed > 0
    }
}

/// Scan a folder with no progress reporting or cancellation (CLI one-shots, tests).
pub fn scan_directory(conn: &Connection, root: &Path) -> Result<ScanReport> {
    scan_directory_inner(conn, root, None, None)
}

/// Scan a folder, reporting progress after each file and checking `cancel_flag`
/// before each file.
pub fn scan_directory_with_progress(
    conn: &Connection,
    root: &Path,
    on_progress: &mut dyn FnMut(&ScanProgress),
    cancel_flag: &AtomicBool,
) -> Result<ScanReport> {
    scan_directory_inner(conn, root, Some(on_progress), Some(cancel_flag))
}

fn scan_directory_inner(
    conn: &Connection,
    root: &Path,
    mut on_progress: Option<&mut dyn FnMut(&ScanProgress)>,
    cancel_flag: Option<&AtomicBool>,
) -> Result<ScanReport> {
    // Full list first so the total is known before any row is written
    let files = discover::discover_video_files(root)?;

    let mut report = ScanReport {
        total_files: files.len(),
        ..ScanReport::default()
    };
    let total = files.len() as u64;

    log::info!("Scanning {} ({} video files)", root.display(), files.len());

    for (idx, video_path) in files.iter().enumerate() {
        if let Some(flag) = cancel_flag {
            if flag.load(Ordering::Relaxed) {
                log::info!("Scan cancelled after {} of {} files", idx, files.len());
                report.cancelled = true;
                return Ok(report);
            }
        }

        match index_file(conn, video_path, &mut report) {
            Ok(()) => report.indexed += 1,
            Err(e) => {
                report.failed += 1;
                log::error!("Failed to index {}: {}", video_path.display(), e);
            }
        }

        if let Some(cb) = on_progress.as_deref_mut() {
            cb(&ScanProgress::new(idx as u64 + 1, total, video_path.to_string_lossy()));
        }
    }

    log::info!(
        "Scan complete: {} indexed, {} failed, {} with sidecar ({} unreadable)",
        report.indexed,
        report.failed,
        report.with_sidecar,
        report.sidecar_errors
    );

    Ok(report)
}

/// Stat, parse and upsert one video.
fn index_file(conn: &Connection, video_path: &Path, report: &mut ScanReport) -> Result<()> {
    // Path is the row identity; a lossy conversion could merge distinct files
    let path = video_path
        .to_str()
        .ok_or_else(|| CatalogError::InvalidPath(format!("not valid UTF-8: {}", video_path.display())))?
        .to_string();
    let mtime = modified_seconds(video_path)?;

    let record = match discover::find_sidecar(video_path) {
        Some(nfo_path) => {
            report.with_sidecar += 1;
            let outcome = parse_nfo(&nfo_path);
            if outcome.diagnostic.is_some() {
                report.sidecar_errors += 1;
            }
            VideoRecord::from_metadata(path, Some(mtime), outcome.metadata)
        }
        None => VideoRecord::bare(path, Some(mtime)),
    };

    log::debug!("Upserting {}", record.path);
    upsert_video(conn, &record)
}

/// Last-modified time as fractional seconds since the Unix epoch.
fn modified_seconds(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified())?;
    let dt: chrono::DateTime<chrono::Utc> = modified.into();
    Ok(dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9)
}
