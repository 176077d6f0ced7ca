//! ISL Churn - inter-satellite link topology churn analysis
//!
//! Simulates the visibility graph of a constellation shell minute by
//! minute and measures how much of it changes between consecutive
//! snapshots:
//!
//! - Uniform-grid spatial index for candidate neighbour lookup
//! - Exact line-of-sight visibility against the shell's horizon distance
//! - Hop-count shortest routes towards a fixed per-satellite target set
//! - Fork-join snapshot construction on a fixed worker pool
//! - Per-minute churn records (links lost, routes changed) and statistics
//!
//! # Pipeline
//!
//! ```text
//! positions(t) -> SpatialIndex -> VisibilityEngine -> VisibilityGraph
//!                                                          |
//!                               targets -> shortest_route -+-> Snapshot(t)
//!
//! ChangeTracker: Snapshot(t-1) x Snapshot(t) -> ChangeRecord
//! StatisticsAggregator: ChangeRecord* (summed over shells) -> ChurnSummary
//! ```

use orbital_mechanics::OrbitalError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

pub mod analysis;
pub mod config;
pub mod export;
pub mod pathfinder;
pub mod pool;
pub mod spatial;
pub mod stats;
pub mod targets;
pub mod tracker;
pub mod visibility;

pub use analysis::{analyze_network, analyze_shell, prepare_shells, PreparedShell, ShellPlan};
pub use config::RunConfig;
pub use pathfinder::VisibilityGraph;
pub use pool::SnapshotWorkerPool;
pub use spatial::SpatialIndex;
pub use stats::{ChurnSeries, ChurnSummary, SeriesStats, StatisticsAggregator};
pub use tracker::ChangeTracker;
pub use visibility::{MaxVisibilityDistance, VisibilityEngine};

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Orbital data error: {0}")]
    Orbital(#[from] OrbitalError),
    #[error("Altitude {0} km is not above the atmosphere")]
    AltitudeBelowAtmosphere(f64),
    #[error("Invalid visibility distance: {0} km")]
    InvalidDistance(f64),
    #[error("Satellite {0} not found")]
    UnknownSatellite(SatId),
    #[error("{targets} target sets for {satellites} satellites")]
    TargetSetMismatch { targets: usize, satellites: usize },
    #[error("Shell {shell} has {found} change records, expected {expected}")]
    ShellMisaligned {
        shell: u8,
        expected: usize,
        found: usize,
    },
    #[error("No change records to summarize")]
    EmptySeries,
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ChurnError>;

/// Dense satellite index within one shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SatId(pub u32);

impl SatId {
    pub fn from_index(index: usize) -> Self {
        SatId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unordered satellite pair, stored with the smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Link(SatId, SatId);

impl Link {
    pub fn new(a: SatId, b: SatId) -> Self {
        if a <= b {
            Link(a, b)
        } else {
            Link(b, a)
        }
    }

    pub fn endpoints(&self) -> (SatId, SatId) {
        (self.0, self.1)
    }

    pub fn contains(&self, id: SatId) -> bool {
        self.0 == id || self.1 == id
    }
}

/// Ordered hop sequence from a source to one of its targets.
///
/// Always holds at least one relay, so never fewer than three ids.
pub type Route = Vec<SatId>;

/// Visible links of one timestep, deduplicated by pair
pub type LinkSet = BTreeSet<Link>;

/// Tracked routes of one timestep, keyed by the {source, target} pair
pub type RouteMap = BTreeMap<Link, Route>;

/// Complete visibility and routing state for one timestep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub links: LinkSet,
    pub routes: RouteMap,
}

/// Churn between one minute and the previous one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub minute: usize,
    /// Links visible in the previous minute but not in this one
    pub broken_links: u64,
    /// Routes tracked in both minutes whose hop sequence differs
    pub path_changes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_is_unordered() {
        let a = SatId(7);
        let b = SatId(3);

        assert_eq!(Link::new(a, b), Link::new(b, a));
        assert_eq!(Link::new(a, b).endpoints(), (b, a));
        assert!(Link::new(a, b).contains(a));
        assert!(!Link::new(a, b).contains(SatId(1)));

        let set: LinkSet = [Link::new(a, b), Link::new(b, a)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_sat_id_display() {
        assert_eq!(SatId::from_index(42).to_string(), "#42");
        assert_eq!(SatId(5).index(), 5);
    }
}
