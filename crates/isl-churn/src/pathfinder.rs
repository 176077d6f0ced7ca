//! Hop-count shortest routes over one timestep's visible links
//!
//! All links weigh one hop, so a breadth-first search returns a shortest
//! route the first time the target is discovered. A route must relay
//! through at least one satellite: when the target is directly visible
//! the search reports no route at all.

use crate::{ChurnError, Link, LinkSet, Result, Route, SatId};
use std::collections::VecDeque;

/// Fewest ids a route may hold (source, relay, target)
pub const MIN_ROUTE_LEN: usize = 3;

/// Adjacency of the visible-link graph for one timestep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityGraph {
    adjacency: Vec<Vec<SatId>>,
}

impl VisibilityGraph {
    /// Build from per-satellite neighbour lists, as produced by
    /// [`crate::VisibilityEngine::visible_neighbors`]
    pub fn from_neighbors(adjacency: Vec<Vec<SatId>>) -> Self {
        Self { adjacency }
    }

    pub fn from_links(satellite_count: usize, links: &LinkSet) -> Self {
        let mut adjacency = vec![Vec::new(); satellite_count];
        for link in links {
            let (a, b) = link.endpoints();
            if a == b || a.index() >= satellite_count || b.index() >= satellite_count {
                continue;
            }
            adjacency[a.index()].push(b);
            adjacency[b.index()].push(a);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }
        Self { adjacency }
    }

    pub fn satellite_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbors(&self, id: SatId) -> &[SatId] {
        self.adjacency.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every link once, regardless of which end listed it
    pub fn links(&self) -> LinkSet {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, neighbors)| {
                let source = SatId::from_index(i);
                neighbors.iter().map(move |&other| Link::new(source, other))
            })
            .collect()
    }

    fn check(&self, id: SatId) -> Result<()> {
        if id.index() < self.adjacency.len() {
            Ok(())
        } else {
            Err(ChurnError::UnknownSatellite(id))
        }
    }
}

/// Shortest relayed route from `source` to `target`, if any.
///
/// Neighbours are expanded in ascending id order, so ties between equally
/// short routes always resolve the same way.
pub fn shortest_route(
    graph: &VisibilityGraph,
    source: SatId,
    target: SatId,
) -> Result<Option<Route>> {
    graph.check(source)?;
    graph.check(target)?;

    if source == target {
        return Ok(None);
    }

    let mut parent: Vec<Option<SatId>> = vec![None; graph.satellite_count()];
    let mut visited = vec![false; graph.satellite_count()];
    let mut queue = VecDeque::new();

    visited[source.index()] = true;
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        for &next in graph.neighbors(current) {
            if visited[next.index()] {
                continue;
            }
            visited[next.index()] = true;
            parent[next.index()] = Some(current);

            if next == target {
                let route = unwind(&parent, target);
                return Ok((route.len() >= MIN_ROUTE_LEN).then_some(route));
            }
            queue.push_back(next);
        }
    }

    Ok(None)
}

fn unwind(parent: &[Option<SatId>], target: SatId) -> Route {
    let mut route = vec![target];
    let mut current = target;
    while let Some(prev) = parent[current.index()] {
        route.push(prev);
        current = prev;
    }
    route.reverse();
    route
}

/// Routes from `source` to each of its targets, keyed by {source, target}
pub fn trace_routes(
    graph: &VisibilityGraph,
    source: SatId,
    targets: &[SatId],
) -> Result<Vec<(Link, Route)>> {
    let mut routes = Vec::with_capacity(targets.len());
    for &target in targets {
        if let Some(route) = shortest_route(graph, source, target)? {
            routes.push((Link::new(source, target), route));
        }
    }
    Ok(routes)
}
