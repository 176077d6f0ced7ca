//! Line-of-sight visibility between satellites of one shell
//!
//! Two satellites at the same altitude can see each other while the
//! segment between them clears the atmosphere. The longest such segment
//! is tangent to the atmosphere shell:
//!
//! ```text
//! d_max = 2 * sqrt((R_earth + h)^2 - (R_earth + h_atm)^2)
//! ```

use crate::spatial::SpatialIndex;
use crate::{ChurnError, Link, LinkSet, Result, SatId};
use orbital_mechanics::{Position, MEAN_EARTH_RADIUS_KM};
use serde::Serialize;

/// Height of the atmosphere a link must clear (km)
pub const ATMOSPHERE_HEIGHT_KM: f64 = 80.0;

/// Maximum line-of-sight distance for a shell, fixed for the run
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct MaxVisibilityDistance(f64);

impl MaxVisibilityDistance {
    pub fn for_altitude(altitude_km: f64) -> Result<Self> {
        if !altitude_km.is_finite() || altitude_km <= ATMOSPHERE_HEIGHT_KM {
            return Err(ChurnError::AltitudeBelowAtmosphere(altitude_km));
        }

        let r = MEAN_EARTH_RADIUS_KM + altitude_km;
        let r_atmosphere = MEAN_EARTH_RADIUS_KM + ATMOSPHERE_HEIGHT_KM;
        Ok(Self(2.0 * (r * r - r_atmosphere * r_atmosphere).sqrt()))
    }

    /// Use an explicit distance instead of the shell geometry
    pub fn from_km(km: f64) -> Result<Self> {
        if !km.is_finite() || km <= 0.0 {
            return Err(ChurnError::InvalidDistance(km));
        }
        Ok(Self(km))
    }

    pub fn km(self) -> f64 {
        self.0
    }

    pub fn covers(self, a: &Position, b: &Position) -> bool {
        (a - b).norm() <= self.0
    }
}

/// Exact visibility on top of spatial-index candidates
pub struct VisibilityEngine<'a> {
    index: &'a SpatialIndex<'a>,
    max_distance: MaxVisibilityDistance,
}

impl<'a> VisibilityEngine<'a> {
    pub fn new(index: &'a SpatialIndex<'a>, max_distance: MaxVisibilityDistance) -> Self {
        Self {
            index,
            max_distance,
        }
    }

    /// Satellites visible from `id`, in ascending id order
    pub fn visible_neighbors(&self, id: SatId) -> Vec<SatId> {
        let Some(origin) = self.index.position(id) else {
            return Vec::new();
        };

        let mut visible: Vec<SatId> = self
            .index
            .candidates(id)
            .into_iter()
            .filter(|other| {
                self.index
                    .position(*other)
                    .is_some_and(|pos| self.max_distance.covers(origin, pos))
            })
            .collect();
        visible.sort_unstable();
        visible
    }

    /// Links incident to `id`; each appears once whichever end asked.
    pub fn links_of(&self, id: SatId) -> impl Iterator<Item = Link> + '_ {
        self.visible_neighbors(id)
            .into_iter()
            .map(move |other| Link::new(id, other))
    }

    /// Every visible link of the timestep
    pub fn all_links(&self) -> LinkSet {
        (0..self.index.len())
            .flat_map(|i| self.links_of(SatId::from_index(i)))
            .collect()
    }
}

/// All-pairs reference visibility, O(n^2)
pub fn brute_force_links(positions: &[Position], max_distance: MaxVisibilityDistance) -> LinkSet {
    let mut links = LinkSet::new();
    for (i, a) in positions.iter().enumerate() {
        for (j, b) in positions.iter().enumerate().skip(i + 1) {
            if max_distance.covers(a, b) {
                links.insert(Link::new(SatId::from_index(i), SatId::from_index(j)));
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_distance_at_550km() {
        let d = MaxVisibilityDistance::for_altitude(550.0).unwrap().km();

        let expected = 2.0 * ((6371.0_f64 + 550.0).powi(2) - (6371.0_f64 + 80.0).powi(2)).sqrt();
        assert!((d - expected).abs() < 1e-9);
        assert!((d - 5013.9).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_max_distance_grows_with_altitude() {
        let shell2 = MaxVisibilityDistance::for_altitude(540.0).unwrap();
        let shell3 = MaxVisibilityDistance::for_altitude(570.0).unwrap();
        assert!(shell3 > shell2);
    }

    #[test]
    fn test_altitude_inside_atmosphere_rejected() {
        assert!(matches!(
            MaxVisibilityDistance::for_altitude(80.0),
            Err(ChurnError::AltitudeBelowAtmosphere(_))
        ));
        assert!(MaxVisibilityDistance::for_altitude(f64::NAN).is_err());
        assert!(MaxVisibilityDistance::from_km(0.0).is_err());
        assert!(MaxVisibilityDistance::from_km(-3.0).is_err());
    }

    #[test]
    fn test_distance_boundary_is_inclusive() {
        let max = MaxVisibilityDistance::from_km(10.0).unwrap();
        let a = Position::new(0.0, 0.0, 0.0);
        assert!(max.covers(&a, &Position::new(10.0, 0.0, 0.0)));
        assert!(!max.covers(&a, &Position::new(10.001, 0.0, 0.0)));
    }

    #[test]
    fn test_visible_neighbors_filters_false_positives() {
        // 0 and 1 share a grid cell but are ~17 km apart
        let positions = vec![
            Position::new(0.1, 0.1, 0.1),
            Position::new(9.9, 9.9, 9.9),
            Position::new(5.0, 5.0, 5.0),
        ];
        let max = MaxVisibilityDistance::from_km(10.0).unwrap();
        let index = SpatialIndex::build(&positions, max.km());
        let engine = VisibilityEngine::new(&index, max);

        assert_eq!(engine.visible_neighbors(SatId(0)), vec![SatId(2)]);
        assert_eq!(engine.visible_neighbors(SatId(1)), vec![SatId(2)]);
        assert_eq!(engine.visible_neighbors(SatId(2)), vec![SatId(0), SatId(1)]);
        assert_eq!(engine.all_links().len(), 2);
    }
}
