//! Output files for a finished run
//!
//! - `<prefix>_isls.json` / `<prefix>_paths.json`: flat per-minute arrays
//! - `<prefix>_series.csv`: `minute,broken_links,path_changes` for plotting
//! - `<prefix>_summary.json`: max/min/mean of both series

use crate::stats::{ChurnSeries, ChurnSummary};
use crate::Result;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths written by [`write_outputs`]
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub broken_links: PathBuf,
    pub path_changes: PathBuf,
    pub series_csv: PathBuf,
    pub summary: PathBuf,
}

impl OutputFiles {
    pub fn new(dir: impl AsRef<Path>, prefix: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            broken_links: dir.join(format!("{}_isls.json", prefix)),
            path_changes: dir.join(format!("{}_paths.json", prefix)),
            series_csv: dir.join(format!("{}_series.csv", prefix)),
            summary: dir.join(format!("{}_summary.json", prefix)),
        }
    }
}

#[derive(Serialize)]
struct SeriesRow {
    minute: usize,
    broken_links: u64,
    path_changes: u64,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(writer, value)?;
    } else {
        serde_json::to_writer(writer, value)?;
    }
    Ok(())
}

pub fn write_outputs(
    dir: impl AsRef<Path>,
    prefix: &str,
    series: &ChurnSeries,
    summary: &ChurnSummary,
) -> Result<OutputFiles> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let files = OutputFiles::new(dir, prefix);

    info!("Writing per-minute series to {:?}", dir);
    write_json(&files.broken_links, &series.broken_links, false)?;
    write_json(&files.path_changes, &series.path_changes, false)?;

    let mut writer = csv::Writer::from_path(&files.series_csv)?;
    let rows = series
        .minutes
        .iter()
        .zip(&series.broken_links)
        .zip(&series.path_changes);
    for ((&minute, &broken_links), &path_changes) in rows {
        writer.serialize(SeriesRow {
            minute,
            broken_links,
            path_changes,
        })?;
    }
    writer.flush()?;

    write_json(&files.summary, summary, true)?;

    Ok(files)
}
