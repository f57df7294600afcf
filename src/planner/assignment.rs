//! Candidate assignment building
//!
//! Every (source, objective) pair yields up to three candidate quantities:
//! everything the source can spare, exactly the objective's need, and a small
//! probe. Candidates are ranked by `score * quantity / distance^2` and drained
//! best-first until one more would push the combination count over the
//! ceiling.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::core::config::SearchConfig;
use crate::core::types::{Cyborgs, Distance, FactoryId};
use crate::graph::DistanceService;
use crate::planner::budget::{combinations_up_to, TurnBudget};
use crate::planner::objective::{Objective, ObjectiveKind, ObjectivePlan};
use crate::world::WorldState;

/// A proposed (origin, objective, quantity) allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    /// Index into `ObjectivePlan::objectives`
    pub objective: usize,
    pub target: FactoryId,
    pub origin: FactoryId,
    pub quantity: Cyborgs,
    pub distance: Distance,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CandidateSet {
    /// Kept candidates, best first
    pub assignments: Vec<Assignment>,
    /// Spare cyborgs at each candidate's origin, aligned with `assignments`
    pub capacities: Vec<Cyborgs>,
    /// Largest group the enumerator may build
    pub max_group_size: usize,
    /// Candidates proposed before pruning
    pub proposed: usize,
    /// Combinations the kept candidates allow
    pub combinations: u64,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Whether troops leaving now would land before or together with a bomb
pub fn bomb_in_the_way(world: &WorldState, target: FactoryId, distance: Distance) -> bool {
    world
        .bombs_targeting(target)
        .filter_map(|b| b.turns_remaining)
        .any(|impact| distance <= impact)
}

/// Reinforcements landing after the factory has fallen are wasted
fn too_late(objective: &Objective, distance: Distance) -> bool {
    objective.kind == ObjectiveKind::Defend && distance > objective.deadline
}

fn candidate_quantities(available: Cyborgs, need: Cyborgs, probe: Cyborgs) -> Vec<Cyborgs> {
    let mut quantities = vec![available];
    if need > 0 && need < available {
        quantities.push(need);
    }
    if probe > 0 && probe < available.min(need) {
        quantities.push(probe);
    }
    quantities
}

/// Propose and prune candidate assignments for this turn
pub fn build_assignments(
    plan: &ObjectivePlan,
    world: &WorldState,
    graph: &DistanceService,
    config: &SearchConfig,
    budget: &TurnBudget,
) -> CandidateSet {
    let mut proposals: Vec<(Assignment, Cyborgs)> = Vec::new();
    for source in plan.sources.iter().filter(|s| s.available > 0) {
        for (index, objective) in plan.objectives.iter().enumerate() {
            if objective.target == source.factory || !graph.is_reachable(source.factory, objective.target) {
                continue;
            }
            let distance = graph.distance(source.factory, objective.target);
            if too_late(objective, distance) || bomb_in_the_way(world, objective.target, distance) {
                continue;
            }
            let weight = f64::from(distance.max(1)).powi(2);
            for quantity in candidate_quantities(source.available, objective.need, config.probe_quantity) {
                proposals.push((
                    Assignment {
                        objective: index,
                        target: objective.target,
                        origin: source.factory,
                        quantity,
                        distance,
                        score: objective.score * f64::from(quantity) / weight,
                    },
                    source.available,
                ));
            }
        }
    }

    let mut queue: BinaryHeap<(OrderedFloat<f64>, Reverse<usize>)> = proposals
        .iter()
        .enumerate()
        .map(|(i, (a, _))| (OrderedFloat(a.score), Reverse(i)))
        .collect();

    let max_group_size = config.max_group_size.max(1);
    let ceiling = budget.combination_ceiling();
    let mut set = CandidateSet {
        max_group_size,
        proposed: proposals.len(),
        ..CandidateSet::default()
    };

    while let Some((_, Reverse(index))) = queue.pop() {
        if budget.time_exhausted() {
            tracing::warn!(kept = set.len(), "Turn budget spent while ranking candidates");
            break;
        }
        let grown = combinations_up_to(set.len() + 1, max_group_size);
        if grown > ceiling {
            break;
        }
        let (assignment, capacity) = &proposals[index];
        set.assignments.push(assignment.clone());
        set.capacities.push(*capacity);
        set.combinations = grown;
    }

    tracing::debug!(
        proposed = set.proposed,
        kept = set.len(),
        combinations = set.combinations,
        "Built candidate assignments"
    );

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Owner;
    use crate::graph::{Link, RoutePolicy};
    use crate::planner::objective::{CapacitySource, Objective, ObjectiveKind};
    use crate::world::Bomb;

    fn graph() -> DistanceService {
        let links = vec![Link::new(0, 1, 2), Link::new(0, 2, 4), Link::new(1, 2, 3)];
        DistanceService::new(3, &links, RoutePolicy::Direct)
    }

    fn objective(target: usize, need: Cyborgs, score: f64) -> Objective {
        Objective {
            target: FactoryId(target),
            kind: ObjectiveKind::Capture,
            need,
            score,
            contested: false,
            deadline: 3,
        }
    }

    fn plan(available: Cyborgs) -> ObjectivePlan {
        ObjectivePlan {
            objectives: vec![objective(1, 5, 8.0), objective(2, 12, 10.0)],
            sources: vec![CapacitySource {
                factory: FactoryId(0),
                available,
            }],
            ..ObjectivePlan::default()
        }
    }

    #[test]
    fn test_candidate_quantities() {
        assert_eq!(candidate_quantities(10, 5, 2), vec![10, 5, 2]);
        assert_eq!(candidate_quantities(4, 5, 2), vec![4, 2]);
        assert_eq!(candidate_quantities(2, 5, 2), vec![2]);
        assert_eq!(candidate_quantities(10, 1, 2), vec![10, 1]);
    }

    #[test]
    fn test_scores_and_order() {
        let world = WorldState::new(3);
        let set = build_assignments(
            &plan(10),
            &world,
            &graph(),
            &SearchConfig::default(),
            &TurnBudget::unlimited_time(12_000),
        );
        // Factory 2 needs more than the source has, so no exact-need candidate
        assert_eq!(set.proposed, 5);
        assert_eq!(set.len(), 5);
        // 8 * 10 / 4 = 20 is the best candidate
        let best = &set.assignments[0];
        assert_eq!((best.target, best.quantity), (FactoryId(1), 10));
        assert!((best.score - 20.0).abs() < 1e-9);
        assert!(set.assignments.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(set.capacities.iter().all(|&c| c == 10));
    }

    #[test]
    fn test_ceiling_prunes_candidates() {
        let world = WorldState::new(3);
        // 3 candidates give 3 + 3 + 1 = 7 combinations; 4 would give 15
        let set = build_assignments(
            &plan(10),
            &world,
            &graph(),
            &SearchConfig::default(),
            &TurnBudget::unlimited_time(10),
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.combinations, 7);
    }

    #[test]
    fn test_skips_targets_about_to_be_bombed() {
        let mut world = WorldState::new(3);
        world.add_bomb(Bomb {
            id: 9,
            owner: Owner::Me,
            origin: FactoryId(0),
            target: Some(FactoryId(1)),
            turns_remaining: Some(3),
        });
        let set = build_assignments(
            &plan(10),
            &world,
            &graph(),
            &SearchConfig::default(),
            &TurnBudget::unlimited_time(12_000),
        );
        assert!(set.assignments.iter().all(|a| a.target == FactoryId(2)));
    }

    #[test]
    fn test_defence_out_of_reach_is_skipped() {
        let world = WorldState::new(3);
        let defend = |deadline| Objective {
            target: FactoryId(2),
            kind: ObjectiveKind::Defend,
            need: 6,
            score: 10.0,
            contested: true,
            deadline,
        };
        let build = |deadline| {
            let plan = ObjectivePlan {
                objectives: vec![defend(deadline)],
                sources: vec![CapacitySource {
                    factory: FactoryId(0),
                    available: 10,
                }],
                ..ObjectivePlan::default()
            };
            build_assignments(
                &plan,
                &world,
                &graph(),
                &SearchConfig::default(),
                &TurnBudget::unlimited_time(12_000),
            )
        };

        // Factory 2 is 4 turns away
        assert!(build(3).is_empty());
        assert_eq!(build(4).len(), 3);
    }
}
