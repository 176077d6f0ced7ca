//! Run configuration
//!
//! Defaults reproduce the reference analysis: a 1438-minute day starting
//! 2024-08-21T00:00:00Z over Starlink shells 2 (540 km, routes tracked to
//! 10 targets) and 3 (570 km, links only).

use crate::{ChurnError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Just under a day of one-minute steps
pub const DEFAULT_DURATION_MINUTES: usize = 1438;

/// Route targets per satellite for TLE shells
pub const UNIFORM_TARGETS_PER_SATELLITE: usize = 10;

/// Route targets per satellite for lon/lat constellations
pub const NONUNIFORM_TARGETS_PER_SATELLITE: usize = 5;

pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub start: DateTime<Utc>,
    pub duration_minutes: usize,
    /// Seed for target selection; drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Worker count; one per core when absent
    pub threads: Option<usize>,
    /// Log progress every this many minutes (0 = never)
    pub progress_interval: usize,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub source: InputSource,
}

/// Where satellite positions come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Directories of per-satellite TLE history CSVs, one per shell
    Tle { shells: Vec<TleShellConfig> },
    /// Precomputed lon/lat tracks on a single shell
    LonLat {
        path: PathBuf,
        targets_per_satellite: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TleShellConfig {
    pub shell: u8,
    pub altitude_km: f64,
    pub directory: PathBuf,
    /// 0 disables route tracking for this shell
    #[serde(default)]
    pub targets_per_satellite: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2024, 8, 21, 0, 0, 0).unwrap(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            seed: None,
            threads: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            output_dir: PathBuf::from("data"),
            output_prefix: "uniform".to_string(),
            source: InputSource::Tle {
                shells: vec![
                    TleShellConfig {
                        shell: 2,
                        altitude_km: 540.0,
                        directory: PathBuf::from("data/shell2_TLE"),
                        targets_per_satellite: UNIFORM_TARGETS_PER_SATELLITE,
                    },
                    TleShellConfig {
                        shell: 3,
                        altitude_km: 570.0,
                        directory: PathBuf::from("data/shell3_TLE"),
                        targets_per_satellite: 0,
                    },
                ],
            },
        }
    }
}

impl RunConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Switch to a lon/lat constellation with its default target count
    pub fn use_lon_lat(&mut self, path: impl Into<PathBuf>) {
        self.source = InputSource::LonLat {
            path: path.into(),
            targets_per_satellite: NONUNIFORM_TARGETS_PER_SATELLITE,
        };
    }

    /// Override the target count of every route-tracking shell
    pub fn set_targets(&mut self, targets: usize) {
        match &mut self.source {
            InputSource::Tle { shells } => {
                for shell in shells.iter_mut().filter(|s| s.targets_per_satellite > 0) {
                    shell.targets_per_satellite = targets;
                }
            }
            InputSource::LonLat { targets_per_satellite, .. } => *targets_per_satellite = targets,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes < 2 {
            return Err(ChurnError::Config(format!(
                "duration of {} minutes leaves nothing to compare",
                self.duration_minutes
            )));
        }
        if self.output_prefix.is_empty() {
            return Err(ChurnError::Config("output prefix is empty".to_string()));
        }
        if let InputSource::Tle { shells } = &self.source {
            if shells.is_empty() {
                return Err(ChurnError::Config("no shells configured".to_string()));
            }
            for (i, shell) in shells.iter().enumerate() {
                if shells[..i].iter().any(|s| s.shell == shell.shell) {
                    return Err(ChurnError::Config(format!(
                        "shell {} configured twice",
                        shell.shell
                    )));
                }
            }
        }
        Ok(())
    }
}
