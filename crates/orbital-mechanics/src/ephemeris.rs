//! Dense per-minute position storage
//!
//! Positions are laid out minute-major so that one timestep's positions
//! form a single contiguous slice indexed by satellite.

use crate::{OrbitalError, Position, Result};

/// Source of per-minute satellite positions for one shell
pub trait PositionProvider {
    fn satellite_count(&self) -> usize;

    fn duration_minutes(&self) -> usize;

    /// All satellites' positions at `minute`, indexed by satellite id
    fn positions_at(&self, minute: usize) -> Result<&[Position]>;
}

/// Read-only position table produced once by propagation
#[derive(Debug, Clone)]
pub struct PositionTable {
    satellite_count: usize,
    duration_minutes: usize,
    positions: Vec<Position>,
}

impl PositionTable {
    /// Build from one track per satellite. Tracks longer than
    /// `duration_minutes` are truncated.
    pub fn from_tracks(tracks: &[Vec<Position>], duration_minutes: usize) -> Result<Self> {
        for (sat, track) in tracks.iter().enumerate() {
            if track.len() < duration_minutes {
                return Err(OrbitalError::InsufficientSamples {
                    satellite: sat.to_string(),
                    available: track.len(),
                    required: duration_minutes,
                });
            }
        }

        let satellite_count = tracks.len();
        let mut positions = Vec::with_capacity(satellite_count * duration_minutes);
        for minute in 0..duration_minutes {
            positions.extend(tracks.iter().map(|track| track[minute]));
        }

        Ok(Self {
            satellite_count,
            duration_minutes,
            positions,
        })
    }

    /// Build from per-minute rows of positions
    pub fn from_snapshots(snapshots: Vec<Vec<Position>>) -> Result<Self> {
        let satellite_count = snapshots.first().map(Vec::len).unwrap_or(0);
        let duration_minutes = snapshots.len();
        let mut positions = Vec::with_capacity(satellite_count * duration_minutes);

        for (minute, row) in snapshots.into_iter().enumerate() {
            if row.len() != satellite_count {
                return Err(OrbitalError::RaggedSnapshot {
                    minute,
                    expected: satellite_count,
                    found: row.len(),
                });
            }
            positions.extend(row);
        }

        Ok(Self {
            satellite_count,
            duration_minutes,
            positions,
        })
    }
}

impl PositionProvider for PositionTable {
    fn satellite_count(&self) -> usize {
        self.satellite_count
    }

    fn duration_minutes(&self) -> usize {
        self.duration_minutes
    }

    fn positions_at(&self, minute: usize) -> Result<&[Position]> {
        if minute >= self.duration_minutes {
            return Err(OrbitalError::MinuteOutOfRange {
                minute,
                duration: self.duration_minutes,
            });
        }
        let start = minute * self.satellite_count;
        Ok(&self.positions[start..start + self.satellite_count])
    }
}

/// One constellation shell: satellites sharing an altitude
#[derive(Debug, Clone)]
pub struct ShellEphemeris {
    pub shell: u8,
    pub altitude_km: f64,
    /// Satellite names, indexed by dense satellite id
    pub names: Vec<String>,
    pub positions: PositionTable,
}

impl PositionProvider for ShellEphemeris {
    fn satellite_count(&self) -> usize {
        self.positions.satellite_count()
    }

    fn duration_minutes(&self) -> usize {
        self.positions.duration_minutes()
    }

    fn positions_at(&self, minute: usize) -> Result<&[Position]> {
        self.positions.positions_at(minute)
    }
}
