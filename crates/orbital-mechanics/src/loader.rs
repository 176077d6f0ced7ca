//! Loading of on-disk constellation inputs
//!
//! Two input layouts are supported:
//!
//! - A directory of per-satellite TLE history CSVs (`EPOCH`, `TLE_LINE1`,
//!   `TLE_LINE2` columns), propagated with SGP4.
//! - A JSON array of precomputed longitude/latitude tracks on a common
//!   circular shell.

use crate::{
    transforms, OrbitalError, Position, PositionTable, Result, ShellEphemeris, TleSatellite,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Shell number assigned to lon/lat constellations
pub const LON_LAT_SHELL: u8 = 1;

/// Raw TLE history row
#[derive(Debug, Deserialize)]
struct TleRow {
    #[serde(rename = "EPOCH")]
    epoch: String,
    #[serde(rename = "TLE_LINE1")]
    tle_line1: String,
    #[serde(rename = "TLE_LINE2")]
    tle_line2: String,
}

/// Raw lon/lat track record. Samples are `[lon, lat]` in radians.
#[derive(Debug, Deserialize)]
struct LonLatRecord {
    altitude_km: f64,
    samples: Vec<[f64; 2]>,
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Pick the first element set whose epoch falls on `date`.
///
/// The whole file is parsed, so a malformed row anywhere fails the load.
fn select_tle(path: &Path, date: &str) -> Result<Option<TleRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut selected = None;
    for row in reader.deserialize() {
        let row: TleRow = row?;
        if selected.is_none() && row.epoch.starts_with(date) {
            selected = Some(row);
        }
    }
    Ok(selected)
}

/// Load the element sets of one shell from a directory of TLE CSVs.
///
/// A satellite whose history has no row on `date` is skipped.
pub fn load_tle_directory(dir: impl AsRef<Path>, date: NaiveDate) -> Result<Vec<TleSatellite>> {
    let dir = dir.as_ref();
    info!("Loading satellites from {:?}", dir);

    let date = date.format("%Y-%m-%d").to_string();
    let mut satellites = Vec::new();
    let mut skipped = 0;

    for path in csv_files(dir)? {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match select_tle(&path, &date)? {
            Some(row) => satellites.push(TleSatellite {
                name,
                tle_line1: row.tle_line1,
                tle_line2: row.tle_line2,
            }),
            None => {
                debug!("Skipping {}: no element set on {}", name, date);
                skipped += 1;
            }
        }
    }

    info!(
        "Loaded {} satellites ({} skipped without an element set on {})",
        satellites.len(),
        skipped,
        date
    );

    Ok(satellites)
}

/// Propagate a shell's element sets into a per-minute position table
pub fn propagate_shell(
    shell: u8,
    altitude_km: f64,
    satellites: &[TleSatellite],
    start: DateTime<Utc>,
    duration_minutes: usize,
) -> Result<ShellEphemeris> {
    info!(
        "Propagating {} satellites of shell {} over {} minutes",
        satellites.len(),
        shell,
        duration_minutes
    );

    let mut tracks = Vec::with_capacity(satellites.len());
    for (i, sat) in satellites.iter().enumerate() {
        debug!("Propagating satellite {}/{}: {}", i + 1, satellites.len(), sat.name);
        tracks.push(sat.track(start, duration_minutes)?);
    }

    Ok(ShellEphemeris {
        shell,
        altitude_km,
        names: satellites.iter().map(|s| s.name.clone()).collect(),
        positions: PositionTable::from_tracks(&tracks, duration_minutes)?,
    })
}

/// Load a lon/lat constellation and convert it to Cartesian positions.
///
/// Every satellite is placed on the shell of the first record's altitude.
pub fn load_lon_lat_constellation(
    path: impl AsRef<Path>,
    duration_minutes: usize,
) -> Result<ShellEphemeris> {
    let path = path.as_ref();
    info!("Loading lon/lat constellation from {:?}", path);

    let file = File::open(path)?;
    let records: Vec<LonLatRecord> = serde_json::from_reader(BufReader::new(file))?;

    let altitude_km = records
        .first()
        .map(|r| r.altitude_km)
        .ok_or_else(|| OrbitalError::EmptyConstellation(path.display().to_string()))?;
    let radius = transforms::shell_radius_km(altitude_km);

    let mut tracks: Vec<Vec<Position>> = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if record.samples.len() < duration_minutes {
            return Err(OrbitalError::InsufficientSamples {
                satellite: idx.to_string(),
                available: record.samples.len(),
                required: duration_minutes,
            });
        }
        tracks.push(
            record.samples[..duration_minutes]
                .iter()
                .map(|[lon, lat]| transforms::spherical_to_cartesian(*lon, *lat, radius))
                .collect(),
        );
    }

    info!(
        "Loaded {} satellites at {} km",
        tracks.len(),
        altitude_km
    );

    Ok(ShellEphemeris {
        shell: LON_LAT_SHELL,
        altitude_km,
        names: (0..tracks.len()).map(|i| i.to_string()).collect(),
        positions: PositionTable::from_tracks(&tracks, duration_minutes)?,
    })
}
