//! All-pairs shortest distances over the factory link graph
//!
//! Built once from the startup edge list and never mutated afterwards.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Distance, FactoryId};
use crate::graph::route::{RoutePolicy, RouteTable};

/// Distance recorded for pairs with no path between them
pub const UNREACHABLE: Distance = Distance::MAX / 4;

/// An undirected link from the startup edge list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub a: FactoryId,
    pub b: FactoryId,
    pub distance: Distance,
}

impl Link {
    pub fn new(a: usize, b: usize, distance: Distance) -> Self {
        Self {
            a: FactoryId(a),
            b: FactoryId(b),
            distance,
        }
    }
}

/// Entry in the Dijkstra frontier
#[derive(Debug, Clone, Copy)]
struct Frontier {
    node: usize,
    cost: Distance,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.node == other.node
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Immutable distance and route service shared by every planner stage
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceService {
    node_count: usize,
    /// Row-major `node_count * node_count` shortest distances
    distances: Vec<Distance>,
    /// Direct link weights, `UNREACHABLE` when two factories are not linked
    links: Vec<Distance>,
    routes: RouteTable,
}

impl DistanceService {
    /// Precompute distances and routes for a board
    ///
    /// Links that reference factories outside `0..node_count` are skipped; the
    /// protocol layer rejects them before they get here.
    pub fn new(node_count: usize, links: &[Link], policy: RoutePolicy) -> Self {
        let mut direct = vec![UNREACHABLE; node_count * node_count];
        for i in 0..node_count {
            direct[i * node_count + i] = 0;
        }
        let mut adjacency: Vec<Vec<(usize, Distance)>> = vec![Vec::new(); node_count];
        for link in links {
            let (a, b) = (link.a.index(), link.b.index());
            if a >= node_count || b >= node_count || a == b {
                continue;
            }
            let weight = link.distance.max(0);
            // Keep the shortest of duplicated links
            if weight < direct[a * node_count + b] {
                direct[a * node_count + b] = weight;
                direct[b * node_count + a] = weight;
            }
        }
        for a in 0..node_count {
            for b in 0..node_count {
                let weight = direct[a * node_count + b];
                if a != b && weight < UNREACHABLE {
                    adjacency[a].push((b, weight));
                }
            }
        }

        let mut distances = Vec::with_capacity(node_count * node_count);
        for source in 0..node_count {
            distances.extend(dijkstra(source, &adjacency));
        }

        let routes = RouteTable::build(node_count, &distances, &direct, policy);

        Self {
            node_count,
            distances,
            links: direct,
            routes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Shortest travel time between two factories
    #[inline]
    pub fn distance(&self, a: FactoryId, b: FactoryId) -> Distance {
        self.distances[a.index() * self.node_count + b.index()]
    }

    /// Weight of the direct link, if the factories are linked
    pub fn link(&self, a: FactoryId, b: FactoryId) -> Option<Distance> {
        let weight = self.links[a.index() * self.node_count + b.index()];
        (a != b && weight < UNREACHABLE).then_some(weight)
    }

    pub fn is_reachable(&self, a: FactoryId, b: FactoryId) -> bool {
        self.distance(a, b) < UNREACHABLE
    }

    /// Path from `a` to `b`, excluding `a`; the first element is the next hop
    pub fn route(&self, a: FactoryId, b: FactoryId) -> Vec<FactoryId> {
        self.routes.route(a, b)
    }

    /// First factory to send troops to when heading from `a` to `b`
    pub fn next_hop(&self, a: FactoryId, b: FactoryId) -> Option<FactoryId> {
        self.routes.next_hop(a, b)
    }

    /// Every linked factory that starts a shortest path from `a` to `b`
    ///
    /// Intermediate hops come first, least crossed first; `b` itself is last
    /// when the direct link is a shortest path.
    pub fn shortest_hops(&self, a: FactoryId, b: FactoryId) -> Vec<FactoryId> {
        if a == b || !self.is_reachable(a, b) {
            return Vec::new();
        }
        let total = self.distance(a, b);
        let mut hops: Vec<FactoryId> = (0..self.node_count)
            .map(FactoryId)
            .filter(|&h| {
                self.link(a, h)
                    .is_some_and(|weight| weight.saturating_add(self.distance(h, b)) == total)
            })
            .collect();
        hops.sort_by_key(|&h| (h == b, self.waypoint_value(h), h));
        hops
    }

    /// Number of ordered factory pairs whose shortest path may pass through `node`
    pub fn waypoint_value(&self, node: FactoryId) -> u32 {
        self.routes.waypoint_value(node)
    }

    /// Sort factories by ascending distance from `origin`
    ///
    /// Uses repeated adjacent-swap passes so equal distances keep their input
    /// order.
    pub fn sort_by_distance(&self, origin: FactoryId, factories: &mut [FactoryId]) {
        let len = factories.len();
        for pass in 0..len {
            let mut swapped = false;
            for i in 0..len.saturating_sub(pass + 1) {
                if self.distance(origin, factories[i]) > self.distance(origin, factories[i + 1]) {
                    factories.swap(i, i + 1);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
    }

    /// Closest reachable factory from `origin` among `candidates`, ignoring `origin` itself
    ///
    /// Ties go to the earliest candidate.
    pub fn nearest(
        &self,
        origin: FactoryId,
        candidates: impl IntoIterator<Item = FactoryId>,
    ) -> Option<FactoryId> {
        let mut best: Option<(Distance, FactoryId)> = None;
        for candidate in candidates {
            if candidate == origin || !self.is_reachable(origin, candidate) {
                continue;
            }
            let distance = self.distance(origin, candidate);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, id)| id)
    }
}

/// Single-source shortest distances over the adjacency list
fn dijkstra(source: usize, adjacency: &[Vec<(usize, Distance)>]) -> Vec<Distance> {
    let mut best = vec![UNREACHABLE; adjacency.len()];
    let mut open_set = BinaryHeap::new();

    best[source] = 0;
    open_set.push(Frontier {
        node: source,
        cost: 0,
    });

    while let Some(Frontier { node, cost }) = open_set.pop() {
        if cost > best[node] {
            continue;
        }
        for &(neighbor, weight) in &adjacency[node] {
            let tentative = cost + weight;
            if tentative < best[neighbor] {
                best[neighbor] = tentative;
                open_set.push(Frontier {
                    node: neighbor,
                    cost: tentative,
                });
            }
        }
    }

    best
}
