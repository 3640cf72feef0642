// CSV export of query results and of the full catalog

use std::io::Write;

use crate::db::schema::{VideoRecord, VideoRow};
use crate::error::Result;

/// Header for filtered query results, in query column order.
pub const QUERY_HEADER: [&str; 10] = [
    "Path", "Genres", "Year", "Directors", "Plot", "Actors", "Duration", "Rating", "Poster", "MTime",
];

/// Header for the maintenance dump, which carries row ids.
pub const MANAGEMENT_HEADER: [&str; 11] = [
    "id", "path", "genres", "year", "directors", "plot", "actors", "duration", "rating", "poster", "mtime",
];

fn mtime_cell(mtime: Option<f64>) -> String {
    mtime.map(|m| m.to_string()).unwrap_or_default()
}

fn record_cells(r: &VideoRecord) -> [String; 10] {
    [
        r.path.clone(),
        r.genres.clone(),
        r.year.clone(),
        r.directors.clone(),
        r.plot.clone(),
        r.actors.clone(),
        r.duration.clone(),
        r.rating.clone(),
        r.poster.clone(),
        mtime_cell(r.mtime),
    ]
}

/// Write query results. Returns the number of data rows written.
pub fn write_query_csv<W: Write>(writer: W, records: &[VideoRecord]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(QUERY_HEADER)?;
    for r in records {
        wtr.write_record(record_cells(r))?;
    }
    wtr.flush()?;
    Ok(records.len())
}

/// Write full rows including ids. Returns the number of data rows written.
pub fn write_management_csv<W: Write>(writer: W, rows: &[VideoRow]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(MANAGEMENT_HEADER)?;
    for row in rows {
        let mut cells = Vec::with_capacity(MANAGEMENT_HEADER.len());
        cells.push(row.id.to_string());
        cells.extend(record_cells(&row.record));
        wtr.write_record(&cells)?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VideoRecord {
        VideoRecord {
            path: "/films/heat.mkv".to_string(),
            genres: "Action|Crime".to_string(),
            year: "1995".to_string(),
            directors: "Michael Mann".to_string(),
            plot: "Cops, robbers, \"heat\".".to_string(),
            mtime: Some(1_700_000_000.25),
            ..VideoRecord::default()
        }
    }

    #[test]
    fn test_query_csv() {
        let mut buf = Vec::new();
        let written = write_query_csv(&mut buf, &[sample(), VideoRecord::bare("/x.mp4", None)]).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Path,Genres,Year,Directors,Plot,Actors,Duration,Rating,Poster,MTime");
        assert_eq!(
            lines[1],
            "/films/heat.mkv,Action|Crime,1995,Michael Mann,\"Cops, robbers, \"\"heat\"\".\",,,,,1700000000.25"
        );
        assert_eq!(lines[2], "/x.mp4,,,,,,,,,");
    }

    #[test]
    fn test_management_csv_has_ids() {
        let mut buf = Vec::new();
        let rows = vec![VideoRow { id: 42, record: sample() }];
        write_management_csv(&mut buf, &rows).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), MANAGEMENT_HEADER.join(","));
        assert!(lines.next().unwrap().starts_with("42,/films/heat.mkv,"));
    }
}
