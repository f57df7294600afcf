//! Next-hop route table
//!
//! Troops are sent one hop at a time, so every ordered pair only needs the
//! first factory of its chosen shortest path. When several shortest paths
//! exist the [`RoutePolicy`] breaks the tie.

use serde::{Deserialize, Serialize};

use crate::core::types::{Distance, FactoryId};
use crate::graph::distance::UNREACHABLE;

/// How to choose between equally short paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePolicy {
    /// Take the direct link whenever it is a shortest path
    Direct,
    /// Prefer stopping at an intermediate factory, picking the one crossed by
    /// the fewest shortest paths
    #[default]
    SpreadTraffic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    node_count: usize,
    next_hops: Vec<Option<FactoryId>>,
    waypoint_values: Vec<u32>,
}

impl RouteTable {
    pub fn build(
        node_count: usize,
        distances: &[Distance],
        direct: &[Distance],
        policy: RoutePolicy,
    ) -> Self {
        let dist = |a: usize, b: usize| distances[a * node_count + b];

        let mut waypoint_values = vec![0u32; node_count];
        for (w, value) in waypoint_values.iter_mut().enumerate() {
            for a in 0..node_count {
                for b in 0..node_count {
                    if a == b || w == a || w == b || dist(a, b) >= UNREACHABLE {
                        continue;
                    }
                    if dist(a, w).saturating_add(dist(w, b)) == dist(a, b) {
                        *value += 1;
                    }
                }
            }
        }

        let mut next_hops = vec![None; node_count * node_count];
        for a in 0..node_count {
            for b in 0..node_count {
                if a == b || dist(a, b) >= UNREACHABLE {
                    continue;
                }
                let candidates = (0..node_count).filter(|&h| {
                    let weight = direct[a * node_count + h];
                    h != a && weight < UNREACHABLE && weight + dist(h, b) == dist(a, b)
                });
                let chosen = match policy {
                    RoutePolicy::Direct => {
                        let candidates: Vec<usize> = candidates.collect();
                        if candidates.contains(&b) {
                            Some(b)
                        } else {
                            candidates.first().copied()
                        }
                    }
                    RoutePolicy::SpreadTraffic => candidates
                        .filter(|&h| h != b)
                        .min_by_key(|&h| (waypoint_values[h], h))
                        .or(Some(b)),
                };
                next_hops[a * node_count + b] = chosen.map(FactoryId);
            }
        }

        Self {
            node_count,
            next_hops,
            waypoint_values,
        }
    }

    pub fn next_hop(&self, a: FactoryId, b: FactoryId) -> Option<FactoryId> {
        self.next_hops[a.index() * self.node_count + b.index()]
    }

    /// Full hop list from `a` to `b`, excluding `a`
    pub fn route(&self, a: FactoryId, b: FactoryId) -> Vec<FactoryId> {
        let mut path = Vec::new();
        let mut current = a;
        // Zero-length links could otherwise cycle
        while current != b && path.len() < self.node_count {
            let Some(hop) = self.next_hop(current, b) else {
                return Vec::new();
            };
            path.push(hop);
            current = hop;
        }
        if current == b {
            path
        } else {
            Vec::new()
        }
    }

    pub fn waypoint_value(&self, node: FactoryId) -> u32 {
        self.waypoint_values[node.index()]
    }
}

#[cfg(test)]
mod tests {
    use crate::core::types::FactoryId;
    use crate::graph::distance::{DistanceService, Link};
    use crate::graph::route::RoutePolicy;

    /// Triangle where 0 -> 2 is as long directly as through 1
    fn triangle(policy: RoutePolicy) -> DistanceService {
        let links = vec![Link::new(0, 1, 2), Link::new(1, 2, 3), Link::new(0, 2, 5)];
        DistanceService::new(3, &links, policy)
    }

    #[test]
    fn test_direct_policy_prefers_link() {
        let graph = triangle(RoutePolicy::Direct);
        assert_eq!(graph.route(FactoryId(0), FactoryId(2)), vec![FactoryId(2)]);
    }

    #[test]
    fn test_spread_policy_prefers_waypoint() {
        let graph = triangle(RoutePolicy::SpreadTraffic);
        assert_eq!(
            graph.route(FactoryId(0), FactoryId(2)),
            vec![FactoryId(1), FactoryId(2)]
        );
    }

    #[test]
    fn test_waypoint_values() {
        let graph = triangle(RoutePolicy::Direct);
        // Factory 1 lies on a shortest path for 0 -> 2 and 2 -> 0 only
        assert_eq!(graph.waypoint_value(FactoryId(1)), 2);
        assert_eq!(graph.waypoint_value(FactoryId(0)), 0);
    }

    #[test]
    fn test_route_to_self_is_empty() {
        let graph = triangle(RoutePolicy::SpreadTraffic);
        assert!(graph.route(FactoryId(1), FactoryId(1)).is_empty());
        assert_eq!(graph.next_hop(FactoryId(1), FactoryId(1)), None);
    }
}
