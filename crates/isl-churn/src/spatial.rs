//! Uniform 3D grid over one timestep's positions
//!
//! With the cell edge equal to the maximum visibility distance, any two
//! satellites within that distance sit in the same or adjacent cells, so
//! scanning the 27 surrounding cells never misses a visible neighbour.

use crate::SatId;
use orbital_mechanics::Position;
use std::collections::HashMap;

/// Integer grid coordinates of a cell
pub type CellKey = (i64, i64, i64);

pub struct SpatialIndex<'a> {
    positions: &'a [Position],
    cell_size: f64,
    grid: HashMap<CellKey, Vec<SatId>>,
}

impl<'a> SpatialIndex<'a> {
    /// Bucket every position into its grid cell. `cell_size` must be positive.
    pub fn build(positions: &'a [Position], cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");

        let mut grid: HashMap<CellKey, Vec<SatId>> = HashMap::new();
        for (i, pos) in positions.iter().enumerate() {
            grid.entry(cell_key(pos, cell_size))
                .or_default()
                .push(SatId::from_index(i));
        }

        Self {
            positions,
            cell_size,
            grid,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, id: SatId) -> Option<&'a Position> {
        self.positions.get(id.index())
    }

    pub fn cell_of(&self, id: SatId) -> Option<CellKey> {
        self.position(id).map(|p| cell_key(p, self.cell_size))
    }

    /// Satellites in the 27 cells around `id`, excluding `id` itself.
    ///
    /// May contain satellites beyond the visibility distance; callers
    /// filter on exact distance. Unknown ids yield no candidates.
    pub fn candidates(&self, id: SatId) -> Vec<SatId> {
        let Some((cx, cy, cz)) = self.cell_of(id) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(cell) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        found.extend(cell.iter().copied().filter(|&other| other != id));
                    }
                }
            }
        }
        found
    }
}

fn cell_key(pos: &Position, cell_size: f64) -> CellKey {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}
