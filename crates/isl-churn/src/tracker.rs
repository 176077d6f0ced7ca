//! Snapshot diffing
//!
//! Churn is deliberately one-sided:
//!
//! - a broken link is one visible in the previous minute and gone now;
//!   links that appear are not counted
//! - a path change is a route present in both minutes whose hop sequence
//!   differs; routes that appear or vanish are not counted

use crate::{ChangeRecord, Snapshot};

/// Links of `prev` missing from `current`
pub fn broken_links(prev: &Snapshot, current: &Snapshot) -> u64 {
    prev.links.difference(&current.links).count() as u64
}

/// Routes tracked in both snapshots whose hop sequence differs
pub fn path_changes(prev: &Snapshot, current: &Snapshot) -> u64 {
    prev.routes
        .iter()
        .filter(|(pair, route)| current.routes.get(*pair).is_some_and(|now| now != *route))
        .count() as u64
}

pub fn diff(minute: usize, prev: &Snapshot, current: &Snapshot) -> ChangeRecord {
    ChangeRecord {
        minute,
        broken_links: broken_links(prev, current),
        path_changes: path_changes(prev, current),
    }
}

/// Holds the previous minute's snapshot between timesteps
pub struct ChangeTracker {
    previous: Snapshot,
}

impl ChangeTracker {
    /// Start from the baseline snapshot, which yields no record itself
    pub fn new(baseline: Snapshot) -> Self {
        Self { previous: baseline }
    }

    /// Diff `current` against the previous minute and make it the new baseline
    pub fn advance(&mut self, minute: usize, current: Snapshot) -> ChangeRecord {
        let record = diff(minute, &self.previous, &current);
        self.previous = current;
        record
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Link, SatId};

    fn link(a: u32, b: u32) -> Link {
        Link::new(SatId(a), SatId(b))
    }

    fn route(raw: &[u32]) -> Vec<SatId> {
        raw.iter().copied().map(SatId).collect()
    }

    fn snapshot(links: &[(u32, u32)], routes: &[(u32, u32, &[u32])]) -> Snapshot {
        Snapshot {
            links: links.iter().map(|&(a, b)| link(a, b)).collect(),
            routes: routes
                .iter()
                .map(|&(a, b, hops)| (link(a, b), route(hops)))
                .collect(),
        }
    }

    #[test]
    fn test_broken_links_is_one_directional() {
        let prev = snapshot(&[(0, 1), (1, 2), (2, 3)], &[]);
        let current = snapshot(&[(0, 1), (3, 4), (4, 5), (5, 6)], &[]);

        assert_eq!(broken_links(&prev, &current), 2);
        assert_eq!(broken_links(&current, &prev), 3);
    }

    #[test]
    fn test_links_compare_by_pair_not_direction() {
        let prev = snapshot(&[(0, 1)], &[]);
        let current = snapshot(&[(1, 0)], &[]);
        assert_eq!(broken_links(&prev, &current), 0);
    }

    #[test]
    fn test_path_changes_ignore_one_sided_routes() {
        let prev = snapshot(
            &[],
            &[
                (0, 3, &[0, 1, 2, 3]), // rerouted
                (0, 5, &[0, 4, 5]),    // unchanged
                (1, 6, &[1, 2, 6]),    // vanishes
            ],
        );
        let current = snapshot(
            &[],
            &[
                (0, 3, &[0, 7, 3]),
                (0, 5, &[0, 4, 5]),
                (2, 8, &[2, 4, 8]), // appears
            ],
        );

        assert_eq!(path_changes(&prev, &current), 1);
        assert_eq!(path_changes(&current, &prev), 1);
    }

    #[test]
    fn test_tracker_advances_baseline() {
        let mut tracker = ChangeTracker::new(snapshot(&[(0, 1), (1, 2)], &[(0, 2, &[0, 1, 2])]));

        let first = tracker.advance(1, snapshot(&[(0, 1)], &[]));
        assert_eq!(
            first,
            ChangeRecord {
                minute: 1,
                broken_links: 1,
                path_changes: 0
            }
        );

        let second = tracker.advance(2, snapshot(&[(0, 1)], &[]));
        assert_eq!(second.broken_links, 0);
        assert_eq!(tracker.previous().links.len(), 1);
    }
}
