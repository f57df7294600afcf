//! Bounded combination enumeration
//!
//! Groups of candidate assignments are enumerated size by size, 1 up to the
//! candidate set's maximum, by stepping a boolean selection mask. Groups that
//! draw more from an origin than it can spare are discarded.

use serde::Serialize;

use crate::planner::assignment::CandidateSet;
use crate::planner::budget::{binomial, TurnBudget};

/// Boolean selection mask over `n` items walking all `k`-subsets
///
/// Starts with the first `k` items selected and moves selections toward the
/// end, so subsets come out in lexicographic order of their indices.
#[derive(Debug, Clone)]
pub struct SelectionMask {
    bits: Vec<bool>,
}

impl SelectionMask {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            bits: (0..n).map(|i| i < k).collect(),
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().filter(|&(_, &b)| b).map(|(i, _)| i)
    }

    /// Step to the next subset; false once every subset has been visited
    pub fn advance(&mut self) -> bool {
        let n = self.bits.len();
        let Some(pivot) = (0..n.saturating_sub(1)).rev().find(|&i| self.bits[i] && !self.bits[i + 1]) else {
            return false;
        };
        let trailing = self.bits[pivot + 2..].iter().filter(|&&b| b).count();
        self.bits[pivot] = false;
        self.bits[pivot + 1] = true;
        for (offset, bit) in self.bits[pivot + 2..].iter_mut().enumerate() {
            *bit = offset < trailing;
        }
        true
    }
}

/// Capacity-feasible groups found this turn
#[derive(Debug, Clone, Default, Serialize)]
pub struct Enumeration {
    /// Indices into `CandidateSet::assignments`
    pub groups: Vec<Vec<usize>>,
    /// Combinations generated, feasible or not
    pub attempted: u64,
    /// Largest group size fully enumerated
    pub completed_size: usize,
}

/// Whether no origin in `members` gives away more than it has
pub fn is_feasible(members: &[usize], candidates: &CandidateSet) -> bool {
    members.iter().all(|&i| {
        let origin = candidates.assignments[i].origin;
        let drawn: i32 = members
            .iter()
            .map(|&j| &candidates.assignments[j])
            .filter(|a| a.origin == origin)
            .fold(0, |total, a| total.saturating_add(a.quantity));
        drawn <= candidates.capacities[i]
    })
}

/// Enumerate feasible groups of increasing size within the turn budget
///
/// The budget is checked before starting each size: a size is only entered
/// if its full enumeration still fits under the combination ceiling and time
/// remains.
pub fn enumerate_groups(candidates: &CandidateSet, budget: &TurnBudget) -> Enumeration {
    let n = candidates.len();
    let max_size = candidates.max_group_size.min(n);
    let ceiling = budget.combination_ceiling();
    let mut result = Enumeration::default();
    let mut members = Vec::with_capacity(max_size);

    for size in 1..=max_size {
        if budget.time_exhausted() {
            tracing::warn!(size, attempted = result.attempted, "Turn budget spent, stopping enumeration");
            break;
        }
        let cost = binomial(n, size);
        if result.attempted.saturating_add(cost) > ceiling {
            tracing::debug!(size, cost, ceiling, "Combination ceiling reached");
            break;
        }

        let mut mask = SelectionMask::new(n, size);
        loop {
            result.attempted += 1;
            members.clear();
            members.extend(mask.selected());
            if is_feasible(&members, candidates) {
                result.groups.push(members.clone());
            }
            if !mask.advance() {
                break;
            }
        }
        result.completed_size = size;
    }

    tracing::debug!(
        attempted = result.attempted,
        feasible = result.groups.len(),
        "Enumerated assignment groups"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cyborgs, FactoryId};
    use crate::planner::assignment::Assignment;
    use std::time::Duration;

    fn assignment(origin: usize, target: usize, quantity: Cyborgs) -> Assignment {
        Assignment {
            objective: target,
            target: FactoryId(target),
            origin: FactoryId(origin),
            quantity,
            distance: 2,
            score: 1.0,
        }
    }

    fn candidates() -> CandidateSet {
        CandidateSet {
            assignments: vec![
                assignment(0, 2, 10),
                assignment(0, 3, 5),
                assignment(1, 2, 4),
                assignment(0, 3, 2),
            ],
            capacities: vec![10, 10, 4, 10],
            max_group_size: 4,
            proposed: 4,
            combinations: 15,
        }
    }

    #[test]
    fn test_mask_walks_all_subsets() {
        let mut mask = SelectionMask::new(4, 2);
        let mut seen = Vec::new();
        loop {
            seen.push(mask.selected().collect::<Vec<_>>());
            if !mask.advance() {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn test_mask_edge_sizes() {
        let mut full = SelectionMask::new(3, 3);
        assert_eq!(full.selected().count(), 3);
        assert!(!full.advance());

        let mut single = SelectionMask::new(1, 1);
        assert!(!single.advance());
    }

    #[test]
    fn test_feasibility() {
        let set = candidates();
        assert!(is_feasible(&[0, 2], &set));
        assert!(!is_feasible(&[0, 1], &set));
        assert!(is_feasible(&[1, 3, 2], &set));
    }

    #[test]
    fn test_enumerate_filters_overdrawn_groups() {
        let set = candidates();
        let result = enumerate_groups(&set, &TurnBudget::unlimited_time(1_000));
        assert_eq!(result.attempted, 15);
        assert_eq!(result.completed_size, 4);
        assert!(result.groups.iter().all(|g| is_feasible(g, &set)));
        assert!(result.groups.contains(&vec![1, 2, 3]));
        assert!(!result.groups.contains(&vec![0, 3]));
    }

    #[test]
    fn test_enumerate_respects_ceiling() {
        let set = candidates();
        // Sizes 1 and 2 cost 4 + 6 = 10; size 3 would need 4 more
        let result = enumerate_groups(&set, &TurnBudget::unlimited_time(12));
        assert_eq!(result.attempted, 10);
        assert_eq!(result.completed_size, 2);
    }

    #[test]
    fn test_enumerate_stops_without_time() {
        let set = candidates();
        let result = enumerate_groups(&set, &TurnBudget::new(Duration::ZERO, 1_000));
        assert_eq!(result.attempted, 0);
        assert!(result.groups.is_empty());
    }
}
