//! Orbital Mechanics Library
//!
//! SGP4 propagation, coordinate transforms and dense per-minute position
//! tables for the shells of a LEO constellation.
//!
//! Everything downstream of this crate sees satellites only as dense
//! integer indices into a [`PositionTable`]; names survive for logging.

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ephemeris;
pub mod loader;

pub use ephemeris::{PositionProvider, PositionTable, ShellEphemeris};

/// Mean Earth radius used for shell geometry (km)
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;

/// Cartesian position in km
pub type Position = Vector3<f64>;

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("Invalid TLE format: {0}")]
    InvalidTle(String),
    #[error("Propagation failed: {0}")]
    PropagationFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Satellite {satellite} has {available} samples, {required} required")]
    InsufficientSamples {
        satellite: String,
        available: usize,
        required: usize,
    },
    #[error("Snapshot at minute {minute} has {found} positions, expected {expected}")]
    RaggedSnapshot {
        minute: usize,
        expected: usize,
        found: usize,
    },
    #[error("Minute {minute} outside position table of {duration} minutes")]
    MinuteOutOfRange { minute: usize, duration: usize },
    #[error("No satellites loaded from {0}")]
    EmptyConstellation(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// One satellite's element set, as selected from its TLE history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TleSatellite {
    pub name: String,
    pub tle_line1: String,
    pub tle_line2: String,
}

impl TleSatellite {
    pub fn propagate(&self, time: DateTime<Utc>) -> Result<Position> {
        propagation::sgp4_propagate(&self.tle_line1, &self.tle_line2, time)
    }

    /// Positions at `start`, `start + 1min`, ... for `minutes` samples
    pub fn track(&self, start: DateTime<Utc>, minutes: usize) -> Result<Vec<Position>> {
        propagation::sgp4_track(&self.tle_line1, &self.tle_line2, start, minutes)
    }
}

pub mod propagation {
    use super::*;

    fn constants_from_tle(
        tle_line1: &str,
        tle_line2: &str,
    ) -> Result<(sgp4::Constants, DateTime<Utc>)> {
        let elements = sgp4::Elements::from_tle(
            None,
            tle_line1.as_bytes(),
            tle_line2.as_bytes(),
        ).map_err(|e| OrbitalError::InvalidTle(format!("{:?}", e)))?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{:?}", e)))?;

        let epoch_utc = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);
        Ok((constants, epoch_utc))
    }

    fn minutes_since(epoch: DateTime<Utc>, time: DateTime<Utc>) -> f64 {
        time.signed_duration_since(epoch).num_seconds() as f64 / 60.0
    }

    fn predict(constants: &sgp4::Constants, minutes_since_epoch: f64) -> Result<Position> {
        let prediction = constants.propagate(minutes_since_epoch)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{:?}", e)))?;

        Ok(Position::new(
            prediction.position[0],
            prediction.position[1],
            prediction.position[2],
        ))
    }

    pub fn sgp4_propagate(
        tle_line1: &str,
        tle_line2: &str,
        time: DateTime<Utc>,
    ) -> Result<Position> {
        let (constants, epoch) = constants_from_tle(tle_line1, tle_line2)?;
        predict(&constants, minutes_since(epoch, time))
    }

    /// Propagate once per minute; the element set is parsed only once.
    pub fn sgp4_track(
        tle_line1: &str,
        tle_line2: &str,
        start: DateTime<Utc>,
        minutes: usize,
    ) -> Result<Vec<Position>> {
        let (constants, epoch) = constants_from_tle(tle_line1, tle_line2)?;

        (0..minutes)
            .map(|minute| {
                let time = start + Duration::minutes(minute as i64);
                predict(&constants, minutes_since(epoch, time))
            })
            .collect()
    }
}

pub mod transforms {
    use super::*;

    /// Point on a sphere of `radius_km` from longitude/latitude in radians.
    pub fn spherical_to_cartesian(lon_rad: f64, lat_rad: f64, radius_km: f64) -> Position {
        Position::new(
            radius_km * lat_rad.cos() * lon_rad.cos(),
            radius_km * lat_rad.cos() * lon_rad.sin(),
            radius_km * lat_rad.sin(),
        )
    }

    /// Geocentric radius of a circular shell at `altitude_km`
    pub fn shell_radius_km(altitude_km: f64) -> f64 {
        MEAN_EARTH_RADIUS_KM + altitude_km
    }
}
