//! Per-satellite route targets
//!
//! Targets are drawn once, at the first timestep, from the satellites a
//! source cannot see at that moment, and stay fixed for the whole run.

use crate::spatial::SpatialIndex;
use crate::visibility::{MaxVisibilityDistance, VisibilityEngine};
use crate::SatId;
use orbital_mechanics::Position;
use rand::seq::SliceRandom;
use rand::Rng;

/// Target ids per source satellite, indexed by source id
pub type TargetSets = Vec<Vec<SatId>>;

/// No satellite tracks any route
pub fn no_targets(satellite_count: usize) -> TargetSets {
    vec![Vec::new(); satellite_count]
}

/// Sample up to `per_satellite` initially non-visible targets for each
/// satellite. Sources are visited in id order, so a seeded `rng` gives a
/// reproducible selection.
pub fn select_targets<R: Rng + ?Sized>(
    positions: &[Position],
    max_distance: MaxVisibilityDistance,
    per_satellite: usize,
    rng: &mut R,
) -> TargetSets {
    if per_satellite == 0 {
        return no_targets(positions.len());
    }

    let index = SpatialIndex::build(positions, max_distance.km());
    let engine = VisibilityEngine::new(&index, max_distance);

    let mut targets = Vec::with_capacity(positions.len());
    for i in 0..positions.len() {
        let source = SatId::from_index(i);
        let visible = engine.visible_neighbors(source);

        // `visible` is sorted, so a binary search keeps this O(n log k)
        let hidden: Vec<SatId> = (0..positions.len())
            .map(SatId::from_index)
            .filter(|&other| other != source && visible.binary_search(&other).is_err())
            .collect();

        targets.push(hidden.choose_multiple(rng, per_satellite).copied().collect());
    }
    targets
}
