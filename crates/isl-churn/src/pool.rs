//! Fork-join snapshot construction
//!
//! One pool is built for the whole run and handed to every timestep.
//! Within a timestep the work fans out per satellite in two stages, each
//! ending in a join:
//!
//! 1. exact visible neighbours of every satellite, merged into the
//!    timestep's visible-link graph
//! 2. route searches from every satellite to its targets over that graph
//!
//! Workers only read the timestep's positions, index, graph and target
//! sets; all merging happens on the calling thread.

use crate::pathfinder::{trace_routes, VisibilityGraph};
use crate::spatial::SpatialIndex;
use crate::targets::TargetSets;
use crate::visibility::{MaxVisibilityDistance, VisibilityEngine};
use crate::{ChurnError, Link, Result, Route, RouteMap, SatId, Snapshot};
use orbital_mechanics::Position;
use rayon::prelude::*;
use std::num::NonZeroUsize;
use tracing::{debug, info};

pub struct SnapshotWorkerPool {
    pool: rayon::ThreadPool,
}

impl SnapshotWorkerPool {
    /// Build a pool of `threads` workers, or one per available core.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let threads = match threads {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("snapshot-worker-{}", i))
            .build()
            .map_err(|e| ChurnError::WorkerPool(e.to_string()))?;

        info!("Snapshot worker pool started with {} workers", threads);
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compute the full snapshot of one timestep.
    ///
    /// `targets` must hold one (possibly empty) set per satellite.
    pub fn snapshot(
        &self,
        positions: &[Position],
        max_distance: MaxVisibilityDistance,
        targets: &TargetSets,
    ) -> Result<Snapshot> {
        if targets.len() != positions.len() {
            return Err(ChurnError::TargetSetMismatch {
                targets: targets.len(),
                satellites: positions.len(),
            });
        }

        let index = SpatialIndex::build(positions, max_distance.km());
        let engine = VisibilityEngine::new(&index, max_distance);

        let adjacency: Vec<Vec<SatId>> = self.pool.install(|| {
            (0..positions.len())
                .into_par_iter()
                .map(|i| engine.visible_neighbors(SatId::from_index(i)))
                .collect()
        });
        let graph = VisibilityGraph::from_neighbors(adjacency);

        let traced: Vec<Vec<(Link, Route)>> = self.pool.install(|| {
            targets
                .par_iter()
                .enumerate()
                .map(|(i, set)| trace_routes(&graph, SatId::from_index(i), set))
                .collect::<Result<Vec<_>>>()
        })?;

        // Merge in source order; a pair tracked from both ends keeps the
        // route found from the higher id.
        let mut routes = RouteMap::new();
        for (link, route) in traced.into_iter().flatten() {
            routes.insert(link, route);
        }

        let links = graph.links();
        debug!(
            "Snapshot: {} satellites, {} links, {} routes",
            positions.len(),
            links.len(),
            routes.len()
        );

        Ok(Snapshot { links, routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::brute_force_links;

    fn scattered(n: usize) -> Vec<Position> {
        // Deterministic spread over a LEO-sized cube
        (0..n)
            .map(|i| {
                let f = i as f64;
                Position::new(
                    (f * 7919.0) % 14000.0 - 7000.0,
                    (f * 104_729.0) % 14000.0 - 7000.0,
                    (f * 1_299_709.0) % 14000.0 - 7000.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_snapshot_links_match_brute_force() {
        let positions = scattered(200);
        let max = MaxVisibilityDistance::for_altitude(550.0).unwrap();
        let pool = SnapshotWorkerPool::new(Some(4)).unwrap();
        assert_eq!(pool.workers(), 4);

        let snapshot = pool
            .snapshot(&positions, max, &vec![Vec::new(); positions.len()])
            .unwrap();

        assert_eq!(snapshot.links, brute_force_links(&positions, max));
        assert!(snapshot.routes.is_empty());
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let positions = scattered(150);
        let max = MaxVisibilityDistance::for_altitude(550.0).unwrap();
        let targets: TargetSets = (0..positions.len())
            .map(|i| vec![SatId::from_index((i + 75) % positions.len())])
            .collect();
        let pool = SnapshotWorkerPool::new(Some(3)).unwrap();

        let first = pool.snapshot(&positions, max, &targets).unwrap();
        let second = pool.snapshot(&positions, max, &targets).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.links).unwrap(),
            serde_json::to_vec(&second.links).unwrap()
        );
    }

    #[test]
    fn test_routes_keep_minimum_length() {
        let positions = scattered(150);
        let max = MaxVisibilityDistance::for_altitude(550.0).unwrap();
        let targets: TargetSets = (0..positions.len())
            .map(|i| {
                (0..positions.len())
                    .filter(|&j| j != i)
                    .take(8)
                    .map(SatId::from_index)
                    .collect()
            })
            .collect();
        let pool = SnapshotWorkerPool::new(Some(2)).unwrap();

        let snapshot = pool.snapshot(&positions, max, &targets).unwrap();
        for (pair, route) in &snapshot.routes {
            assert!(route.len() >= 3);
            let (a, b) = pair.endpoints();
            let ends = Link::new(route[0], route[route.len() - 1]);
            assert_eq!(ends, Link::new(a, b));
            for hop in route.windows(2) {
                assert!(snapshot.links.contains(&Link::new(hop[0], hop[1])));
            }
        }
    }

    #[test]
    fn test_worker_error_propagates() {
        let positions = scattered(10);
        let max = MaxVisibilityDistance::for_altitude(550.0).unwrap();
        let mut targets = vec![Vec::new(); positions.len()];
        targets[3] = vec![SatId(99)];
        let pool = SnapshotWorkerPool::new(Some(2)).unwrap();

        let err = pool.snapshot(&positions, max, &targets).unwrap_err();
        assert!(matches!(err, ChurnError::UnknownSatellite(SatId(99))));

        // The pool survives a failed timestep
        assert!(pool.snapshot(&positions, max, &vec![Vec::new(); 10]).is_ok());
    }

    #[test]
    fn test_target_set_count_checked() {
        let positions = scattered(5);
        let max = MaxVisibilityDistance::for_altitude(550.0).unwrap();
        let pool = SnapshotWorkerPool::new(Some(1)).unwrap();

        assert!(matches!(
            pool.snapshot(&positions, max, &vec![Vec::new(); 4]),
            Err(ChurnError::TargetSetMismatch {
                targets: 4,
                satellites: 5
            })
        ));
    }
}
