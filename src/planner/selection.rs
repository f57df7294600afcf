//! Group scoring and selection
//!
//! A group's value is the sum of its assignments' base scores, each weighted
//! by how well the group as a whole fulfils that assignment's objective. The
//! fulfillment curve is pluggable; the canonical one rewards meeting a need
//! and penalises overshooting it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::core::config::{CurveKind, FulfillmentConfig};
use crate::planner::assignment::CandidateSet;
use crate::planner::objective::Objective;

/// Maps committed/needed to a value multiplier
pub trait FulfillmentCurve {
    fn value(&self, fulfillment: f64, contested: bool) -> f64;
}

/// Linear up to a cap, then loses one point per point of overshoot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvershootPenalty {
    pub neutral_cap: f64,
    pub contested_cap: f64,
    pub floor: f64,
}

impl FulfillmentCurve for OvershootPenalty {
    fn value(&self, fulfillment: f64, contested: bool) -> f64 {
        let cap = if contested { self.contested_cap } else { self.neutral_cap };
        if fulfillment <= cap {
            fulfillment
        } else {
            (cap - (fulfillment - cap)).max(self.floor)
        }
    }
}

/// Saturates smoothly toward `scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiminishingReturns {
    pub scale: f64,
}

impl FulfillmentCurve for DiminishingReturns {
    fn value(&self, fulfillment: f64, _contested: bool) -> f64 {
        self.scale * (1.0 - (-fulfillment / self.scale).exp())
    }
}

/// Curve chosen by configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringCurve {
    Overshoot(OvershootPenalty),
    Diminishing(DiminishingReturns),
}

impl ScoringCurve {
    pub fn from_config(config: &FulfillmentConfig) -> Self {
        match config.curve {
            CurveKind::Overshoot => Self::Overshoot(OvershootPenalty {
                neutral_cap: config.neutral_cap,
                contested_cap: config.contested_cap,
                floor: config.floor,
            }),
            CurveKind::Diminishing => Self::Diminishing(DiminishingReturns {
                scale: config.diminishing_scale.max(f64::EPSILON),
            }),
        }
    }
}

impl FulfillmentCurve for ScoringCurve {
    fn value(&self, fulfillment: f64, contested: bool) -> f64 {
        match self {
            Self::Overshoot(curve) => curve.value(fulfillment, contested),
            Self::Diminishing(curve) => curve.value(fulfillment, contested),
        }
    }
}

/// Score one group of candidate indices
pub fn score_group(
    members: &[usize],
    candidates: &CandidateSet,
    objectives: &[Objective],
    curve: &dyn FulfillmentCurve,
) -> f64 {
    members
        .iter()
        .map(|&i| {
            let assignment = &candidates.assignments[i];
            let objective = &objectives[assignment.objective];
            let committed: i32 = members
                .iter()
                .map(|&j| &candidates.assignments[j])
                .filter(|a| a.objective == assignment.objective)
                .fold(0, |total, a| total.saturating_add(a.quantity));
            let fulfillment = f64::from(committed) / f64::from(objective.need.max(1));
            assignment.score * curve.value(fulfillment, objective.contested)
        })
        .sum()
}

/// The winning group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub members: Vec<usize>,
    pub score: f64,
}

/// Pick the highest scoring group; earlier groups win ties
///
/// Returns `None` when there are no groups or none has positive value.
pub fn select_best(
    groups: &[Vec<usize>],
    candidates: &CandidateSet,
    objectives: &[Objective],
    curve: &dyn FulfillmentCurve,
) -> Option<Selection> {
    let mut queue: BinaryHeap<(OrderedFloat<f64>, Reverse<usize>)> = groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            (
                OrderedFloat(score_group(group, candidates, objectives, curve)),
                Reverse(i),
            )
        })
        .collect();

    let (OrderedFloat(score), Reverse(index)) = queue.pop()?;
    if score <= 0.0 {
        return None;
    }
    Some(Selection {
        members: groups[index].clone(),
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cyborgs, FactoryId};
    use crate::planner::assignment::Assignment;
    use crate::planner::objective::ObjectiveKind;

    fn objective(target: usize, need: Cyborgs, contested: bool) -> Objective {
        Objective {
            target: FactoryId(target),
            kind: ObjectiveKind::Capture,
            need,
            score: 10.0,
            contested,
            deadline: 2,
        }
    }

    fn assignment(objective: usize, origin: usize, quantity: Cyborgs, score: f64) -> Assignment {
        Assignment {
            objective,
            target: FactoryId(objective + 10),
            origin: FactoryId(origin),
            quantity,
            distance: 2,
            score,
        }
    }

    fn overshoot() -> OvershootPenalty {
        OvershootPenalty {
            neutral_cap: 1.4,
            contested_cap: 4.0,
            floor: 0.0,
        }
    }

    #[test]
    fn test_overshoot_curve() {
        let curve = overshoot();
        assert_eq!(curve.value(0.5, false), 0.5);
        assert_eq!(curve.value(1.4, false), 1.4);
        assert!((curve.value(2.0, false) - 0.8).abs() < 1e-9);
        assert_eq!(curve.value(5.0, false), 0.0);
        assert_eq!(curve.value(3.0, true), 3.0);
        assert_eq!(curve.value(5.0, true), 3.0);
    }

    #[test]
    fn test_diminishing_curve_is_monotone() {
        let curve = DiminishingReturns { scale: 1.5 };
        let values: Vec<f64> = [0.0, 0.5, 1.0, 2.0, 8.0].iter().map(|&f| curve.value(f, false)).collect();
        assert_eq!(values[0], 0.0);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(values[4] < 1.5);
    }

    #[test]
    fn test_scoring_curve_from_config() {
        let mut config = FulfillmentConfig::default();
        assert!(matches!(ScoringCurve::from_config(&config), ScoringCurve::Overshoot(_)));
        config.curve = CurveKind::Diminishing;
        assert!(matches!(ScoringCurve::from_config(&config), ScoringCurve::Diminishing(_)));
    }

    #[test]
    fn test_group_score_uses_combined_fulfillment() {
        let objectives = vec![objective(0, 10, false)];
        let candidates = CandidateSet {
            assignments: vec![assignment(0, 1, 5, 2.0), assignment(0, 2, 5, 3.0)],
            capacities: vec![5, 5],
            max_group_size: 2,
            ..CandidateSet::default()
        };
        let curve = overshoot();
        // Alone each covers half the need
        assert!((score_group(&[0], &candidates, &objectives, &curve) - 1.0).abs() < 1e-9);
        // Together they meet it exactly
        assert!((score_group(&[0, 1], &candidates, &objectives, &curve) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_best_prefers_meeting_need() {
        let objectives = vec![objective(0, 6, false), objective(1, 4, false)];
        let candidates = CandidateSet {
            assignments: vec![
                assignment(0, 1, 20, 5.0),
                assignment(0, 1, 6, 3.0),
                assignment(1, 1, 4, 2.0),
            ],
            capacities: vec![20, 20, 20],
            max_group_size: 3,
            ..CandidateSet::default()
        };
        let groups = vec![vec![0], vec![1], vec![2], vec![1, 2]];
        let best = select_best(&groups, &candidates, &objectives, &overshoot()).unwrap();
        // Sending 20 for a need of 6 overshoots to nothing
        assert_eq!(best.members, vec![1, 2]);
        assert!((best.score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_best_empty() {
        let candidates = CandidateSet::default();
        assert!(select_best(&[], &candidates, &[], &overshoot()).is_none());
    }
}
