// vidcat CLI binary

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rusqlite::Connection;

use vidcat_lib::constants::{DEFAULT_PLAYLIST_SIZE, DEFAULT_QUERY_LIMIT};
use vidcat_lib::db::{open_db, resolve_db_path, schema};
use vidcat_lib::export;
use vidcat_lib::query::{self, FacetIndex, VideoFilter};
use vidcat_lib::scan::{self, ScanProgress};
use vidcat_lib::{MatchField, MatchMode, SortColumn, VideoRecord};

#[derive(Parser)]
#[command(name = "vidcat")]
#[command(about = "vidcat - index a video folder from .nfo sidecars and filter it by genre, year and director", long_about = None)]
#[command(version)]
struct Cli {
    /// Catalog database (defaults to $VIDCAT_DB, then the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Genre to match (substring); repeat for any-of
    #[arg(long = "genre")]
    genres: Vec<String>,
    /// Year to match (exact); repeat for any-of
    #[arg(long = "year")]
    years: Vec<String>,
    /// Director to match (substring); repeat for any-of
    #[arg(long = "director")]
    directors: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> VideoFilter {
        VideoFilter::new()
            .genres(self.genres.iter().cloned())
            .years(self.years.iter().cloned())
            .directors(self.directors.iter().cloned())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder and index every video (Ctrl-C stops after the current file)
    Scan {
        /// Folder to scan
        path: PathBuf,
    },

    /// Show the distinct genres, years and directors
    Facets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List videos matching the filters, ordered by path
    Query {
        #[command(flatten)]
        filter: FilterArgs,
        /// Maximum rows to return
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: i64,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every row with its id
    List {
        /// Sort column: id, path, year, mtime or rating
        #[arg(long, default_value = "path")]
        sort: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one video's details
    Show {
        /// Absolute path of the video
        path: String,
    },

    /// Delete rows by id
    Delete {
        /// Row ids (see `vidcat list`)
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete rows whose field contains (or with --exact, equals) a value
    DeleteMatch {
        /// One of: path, genres, year, directors, actors, duration, rating, poster
        field: String,
        /// Value to match
        pattern: String,
        /// Require the whole field to equal the value
        #[arg(long)]
        exact: bool,
    },

    /// Reclaim space left by deleted rows
    Compact,

    /// Export to CSV
    ExportCsv {
        /// Destination file
        output: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Export every row with ids instead of filtered results
        #[arg(long)]
        all: bool,
    },

    /// Write a random M3U playlist from the videos matching the filters
    Playlist {
        #[command(flatten)]
        filter: FilterArgs,
        /// Number of videos
        #[arg(long, default_value_t = DEFAULT_PLAYLIST_SIZE)]
        count: usize,
        /// Destination file (defaults to ~/random_playlist_<timestamp>.m3u)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seed for a reproducible selection
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let db_path = resolve_db_path(cli.db.as_deref());
    let conn = open_db(&db_path)
        .with_context(|| format!("Cannot open catalog {}", db_path.display()))?;

    match cli.command {
        Commands::Scan { path } => cmd_scan(&conn, &path),
        Commands::Facets { json } => cmd_facets(&conn, json),
        Commands::Query { filter, limit, json } => cmd_query(&conn, &filter, limit, json),
        Commands::List { sort, json } => cmd_list(&conn, &sort, json),
        Commands::Show { path } => cmd_show(&conn, &path),
        Commands::Delete { ids } => cmd_delete(&conn, &ids),
        Commands::DeleteMatch { field, pattern, exact } => cmd_delete_match(&conn, &field, &pattern, exact),
        Commands::Compact => cmd_compact(&conn),
        Commands::ExportCsv { output, filter, all } => cmd_export_csv(&conn, &output, &filter, all),
        Commands::Playlist { filter, count, output, seed } => cmd_playlist(&conn, &filter, count, output, seed),
    }
}

fn cmd_scan(conn: &Connection, path: &Path) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
            log::warn!("Ctrl-C handler unavailable, scan cannot be interrupted: {}", e);
        }
    }

    let mut on_progress = |p: &ScanProgress| {
        eprint!("\r[{}/{}] {:>3.0}%", p.current, p.total, p.percent);
        if p.is_done() {
            eprintln!();
        }
    };

    let report = scan::scan_directory_with_progress(conn, path, &mut on_progress, &cancel)?;

    println!();
    if report.is_partial() {
        println!("Scan completed (possibly partial):");
    } else {
        println!("Scan completed:");
    }
    println!("  Video files:   {}", report.total_files);
    println!("  Indexed:       {}", report.indexed);
    println!("  Failed:        {}", report.failed);
    println!("  With sidecar:  {}", report.with_sidecar);
    if report.sidecar_errors > 0 {
        println!("  Bad sidecars:  {}", report.sidecar_errors);
    }
    if report.cancelled {
        println!("  Stopped early; {} files not visited.", report.total_files - report.indexed - report.failed);
    }

    Ok(())
}

fn cmd_facets(conn: &Connection, json: bool) -> Result<()> {
    let facets = FacetIndex::load(conn)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&facets)?);
        return Ok(());
    }

    if facets.is_empty() {
        println!("Catalog is empty. Use 'vidcat scan <folder>' first.");
        return Ok(());
    }

    print_facet("Genres", &facets.genres);
    print_facet("Years", &facets.years);
    print_facet("Directors", &facets.directors);
    Ok(())
}

fn print_facet(title: &str, values: &[String]) {
    println!("{} ({}):", title, values.len());
    for v in values {
        println!("  {}", v);
    }
}

fn cmd_query(conn: &Connection, filter: &FilterArgs, limit: i64, json: bool) -> Result<()> {
    let videos = query::query_videos(conn, &filter.to_filter(), limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&videos)?);
        return Ok(());
    }

    if videos.is_empty() {
        println!("No videos match.");
        return Ok(());
    }

    println!("{:>6}  {:<30}  {:<25}  {}", "Year", "Genres", "Directors", "Path");
    println!("{}", "-".repeat(90));
    for v in &videos {
        println!("{:>6}  {:<30}  {:<25}  {}",
            v.year,
            truncate(&v.genres, 30),
            truncate(&v.directors, 25),
            v.path
        );
    }

    println!();
    println!("{} videos", videos.len());
    if may_be_capped(videos.len(), limit) {
        println!("Result may be capped at {}. Use --limit to see more.", limit);
    }
    Ok(())
}

fn cmd_list(conn: &Connection, sort: &str, json: bool) -> Result<()> {
    let order_by = sort.parse::<SortColumn>().unwrap_or_else(|_| {
        log::warn!("Unknown sort column '{}', sorting by path", sort);
        SortColumn::Path
    });
    let rows = schema::fetch_all(conn, order_by)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:>6}  {:>6}  {:>6}  {}", "ID", "Year", "Rating", "Path");
    println!("{}", "-".repeat(70));
    for row in &rows {
        println!("{:>6}  {:>6}  {:>6}  {}", row.id, row.record.year, row.record.rating, row.record.path);
    }
    println!();
    println!("{} rows", rows.len());
    Ok(())
}

fn cmd_show(conn: &Connection, path: &str) -> Result<()> {
    let row = schema::get_video_by_path(conn, path)?
        .ok_or_else(|| anyhow::anyhow!("{} is not in the catalog", path))?;
    let v: &VideoRecord = &row.record;

    println!("Video #{}", row.id);
    println!();
    println!("Path:        {}", v.path);
    print_field("Year", &v.year);
    print_list("Genres", &v.genre_list());
    print_list("Directors", &v.director_list());
    print_list("Actors", &v.actor_list());
    print_field("Duration", &v.duration);
    print_field("Rating", &v.rating);
    print_field("Poster", &v.poster);
    if let Some(mtime) = v.mtime {
        let secs = mtime.trunc() as i64;
        let nanos = (mtime.fract() * 1e9) as u32;
        if let Some(dt) = chrono::DateTime::from_timestamp(secs, nanos) {
            println!("Modified:    {}", dt.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    if !v.plot.is_empty() {
        println!();
        println!("{}", v.plot);
    }
    Ok(())
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{:<12} {}", format!("{}:", label), value);
    }
}

fn print_list(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("{:<12} {}", format!("{}:", label), values.join(", "));
    }
}

fn cmd_delete(conn: &Connection, ids: &[i64]) -> Result<()> {
    let removed = schema::delete_ids(conn, ids)?;
    println!("Deleted {} of {} requested rows", removed, ids.len());
    Ok(())
}

fn cmd_delete_match(conn: &Connection, field: &str, pattern: &str, exact: bool) -> Result<()> {
    let field: MatchField = field.parse().map_err(|_| {
        let allowed: Vec<&str> = MatchField::ALL.iter().map(|f| f.column()).collect();
        anyhow::anyhow!("Invalid field '{}'. Allowed: {}", field, allowed.join(", "))
    })?;
    let mode = if exact { MatchMode::Exact } else { MatchMode::Contains };

    let removed = schema::delete_by_field_match(conn, field, pattern, mode)?;
    println!("Deleted {} rows where {} {} '{}'",
        removed,
        field,
        if exact { "=" } else { "contains" },
        pattern
    );
    Ok(())
}

fn cmd_compact(conn: &Connection) -> Result<()> {
    schema::vacuum(conn)?;
    println!("Catalog compacted");
    Ok(())
}

/// A full page means more rows may exist past the limit.
fn may_be_capped(returned: usize, limit: i64) -> bool {
    limit > 0 && returned as i64 == limit
}

fn cmd_export_csv(conn: &Connection, output: &Path, filter: &FilterArgs, all: bool) -> Result<()> {
    // Rows are fetched before the file is created so a failed read leaves nothing behind
    let written = if all {
        let rows = schema::fetch_all(conn, SortColumn::Path)?;
        export::write_management_csv(create_output(output)?, &rows)?
    } else {
        // Exports are not capped like interactive queries
        let videos = query::query_videos(conn, &filter.to_filter(), i64::MAX)?;
        export::write_query_csv(create_output(output)?, &videos)?
    };

    println!("Exported {} records to {}", written, output.display());
    Ok(())
}

fn cmd_playlist(
    conn: &Connection,
    filter: &FilterArgs,
    count: usize,
    output: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let candidates = query::query_paths(conn, &filter.to_filter(), DEFAULT_QUERY_LIMIT)?;
    if candidates.is_empty() {
        anyhow::bail!("No videos match; nothing to add to the playlist");
    }

    let selection = match seed {
        Some(s) => export::sample_paths(&candidates, count, &mut rand::rngs::StdRng::seed_from_u64(s)),
        None => export::sample_paths(&candidates, count, &mut rand::thread_rng()),
    };

    let dest = output.unwrap_or_else(|| {
        let home = directories::BaseDirs::new()
            .map(|d| d.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        export::default_playlist_path(&home, chrono::Utc::now())
    });
    export::write_m3u(&dest, &selection)?;

    println!("Playlist created: {} ({} of {} matching videos)", dest.display(), selection.len(), candidates.len());
    for item in schema::get_videos_by_paths(conn, &selection)? {
        let year = if item.year.is_empty() { String::new() } else { format!(" ({})", item.year) };
        println!("  {}{}", item.path, year);
    }
    Ok(())
}

fn create_output(output: &Path) -> Result<std::fs::File> {
    std::fs::File::create(output).with_context(|| format!("Cannot create {}", output.display()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vidcat_lib::db::open_in_memory;

    #[test]
    fn test_may_be_capped() {
        assert!(may_be_capped(10, 10));
        assert!(!may_be_capped(9, 10));
        assert!(!may_be_capped(0, 0));
        assert!(!may_be_capped(0, -5));
    }

    #[test]
    fn test_export_csv_writes_rows() {
        let tmp = TempDir::new().unwrap();
        let conn = open_in_memory().unwrap();
        schema::upsert_video(&conn, &VideoRecord::bare("/v/a.mp4".to_string(), None)).unwrap();
        let output = tmp.path().join("out.csv");

        cmd_export_csv(&conn, &output, &FilterArgs::default(), false).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("/v/a.mp4"));
    }

    #[test]
    fn test_export_csv_failed_read_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let conn = open_in_memory().unwrap();
        conn.execute_batch("DROP TABLE videos").unwrap();
        let output = tmp.path().join("out.csv");

        assert!(cmd_export_csv(&conn, &output, &FilterArgs::default(), false).is_err());
        assert!(cmd_export_csv(&conn, &output, &FilterArgs::default(), true).is_err());
        assert!(!output.exists());
    }
}
