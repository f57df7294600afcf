//! Objective generation
//!
//! Every factory gets exactly one role per turn: a defend objective, a
//! capture objective, a capacity source, or nothing.

use serde::Serialize;

use crate::core::config::{PlannerConfig, ValueConfig};
use crate::core::types::{Cyborgs, Distance, FactoryId, Owner, MAX_PRODUCTION};
use crate::graph::DistanceService;
use crate::planner::forecast::{forecast_hostile, forecast_owned, AttackForecast, GarrisonForecast};
use crate::world::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectiveKind {
    Defend,
    Capture,
}

/// A factory worth sending cyborgs to this turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    pub target: FactoryId,
    pub kind: ObjectiveKind,
    pub need: Cyborgs,
    pub score: f64,
    /// Held or reachable by the opponent; loosens the overshoot cap
    pub contested: bool,
    /// Turn by which help must land (defence) or our fastest arrival (capture)
    pub deadline: Distance,
}

/// An owned factory with cyborgs to spare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacitySource {
    pub factory: FactoryId,
    pub available: Cyborgs,
}

/// What the generator decided for one factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeRole {
    /// Index into `ObjectivePlan::objectives`
    Objective(usize),
    /// Index into `ObjectivePlan::sources`
    Source(usize),
    None,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ObjectivePlan {
    pub objectives: Vec<Objective>,
    pub sources: Vec<CapacitySource>,
    /// One entry per factory
    pub roles: Vec<NodeRole>,
    /// Forecasts of our own factories, kept for secondary actions
    pub garrisons: Vec<GarrisonForecast>,
}

impl ObjectivePlan {
    pub fn total_capacity(&self) -> Cyborgs {
        self.sources.iter().fold(0, |total, s| total.saturating_add(s.available))
    }

    pub fn source_mut(&mut self, factory: FactoryId) -> Option<&mut CapacitySource> {
        self.sources.iter_mut().find(|s| s.factory == factory)
    }

    pub fn garrison(&self, factory: FactoryId) -> Option<&GarrisonForecast> {
        self.garrisons.iter().find(|g| g.factory == factory)
    }

    /// Withdraw the objective on `target`, keeping role indices aligned
    pub fn drop_objective(&mut self, target: FactoryId) -> bool {
        let Some(index) = self.objectives.iter().position(|o| o.target == target) else {
            return false;
        };
        self.objectives.remove(index);
        for role in &mut self.roles {
            if let NodeRole::Objective(i) = *role {
                if i == index {
                    *role = NodeRole::None;
                } else if i > index {
                    *role = NodeRole::Objective(i - 1);
                }
            }
        }
        true
    }
}

/// Stepped value of a production level
pub fn production_value(production: i32, value: &ValueConfig) -> f64 {
    let tier = production.clamp(0, MAX_PRODUCTION) as usize;
    value.production_tiers[tier] * value.production_weight
}

/// Closeness to our territory in `[0, 1]`
fn proximity(world: &WorldState, graph: &DistanceService, id: FactoryId) -> f64 {
    let average = world.average_distance(graph, id, Owner::Me, 0);
    if average <= 0.0 {
        1.0
    } else {
        (1.0 / average).clamp(0.0, 1.0)
    }
}

fn defend_score(world: &WorldState, graph: &DistanceService, id: FactoryId, value: &ValueConfig) -> f64 {
    let factory = world.factory(id);
    production_value(factory.production, value)
        * value.defense_weight
        * (1.0 + value.proximity_weight * proximity(world, graph, id))
}

fn capture_score(
    world: &WorldState,
    graph: &DistanceService,
    forecast: &AttackForecast,
    value: &ValueConfig,
) -> f64 {
    let factory = world.factory(forecast.factory);
    let contest = 1.0 / (1.0 + f64::from(forecast.enemies.max(0)));
    let mut score = production_value(factory.production, value)
        * (1.0 + value.proximity_weight * proximity(world, graph, forecast.factory))
        * (1.0 + value.contest_weight * contest);
    if score > 0.0 && factory.owner == Owner::Neutral {
        score += value.neutral_bonus * f64::from(factory.production);
    }
    let bombed = world
        .bombs_targeting(forecast.factory)
        .any(|b| b.owner == Owner::Me);
    if bombed {
        score *= value.bomb_bonus;
    }
    score
}

/// Build this turn's objectives and capacity sources
pub fn generate_objectives(world: &WorldState, graph: &DistanceService, config: &PlannerConfig) -> ObjectivePlan {
    let mut plan = ObjectivePlan {
        roles: vec![NodeRole::None; world.node_count()],
        ..ObjectivePlan::default()
    };
    let enemy_ids = world.owned_ids(Owner::Enemy);

    for factory in world.factories() {
        let id = factory.id;
        let role = if factory.owner == Owner::Me {
            let forecast = forecast_owned(world, id, &config.forecast);
            let role = if forecast.need > 0 {
                let score = defend_score(world, graph, id, &config.value);
                if score > 0.0 {
                    plan.objectives.push(Objective {
                        target: id,
                        kind: ObjectiveKind::Defend,
                        need: forecast.need,
                        score,
                        contested: true,
                        deadline: forecast.first_emergency.unwrap_or(config.forecast.horizon),
                    });
                    NodeRole::Objective(plan.objectives.len() - 1)
                } else {
                    NodeRole::None
                }
            } else if forecast.idle > 0 {
                plan.sources.push(CapacitySource {
                    factory: id,
                    available: forecast.idle,
                });
                NodeRole::Source(plan.sources.len() - 1)
            } else {
                NodeRole::None
            };
            plan.garrisons.push(forecast);
            role
        } else {
            match forecast_hostile(world, graph, id, &config.forecast) {
                Some(forecast) if forecast.takeable() => {
                    let score = capture_score(world, graph, &forecast, &config.value);
                    if score > 0.0 {
                        let contested = factory.owner == Owner::Enemy
                            || graph
                                .nearest(id, enemy_ids.iter().copied())
                                .is_some_and(|e| graph.distance(e, id) <= forecast.eta);
                        plan.objectives.push(Objective {
                            target: id,
                            kind: ObjectiveKind::Capture,
                            need: forecast.need,
                            score,
                            contested,
                            deadline: forecast.eta,
                        });
                        NodeRole::Objective(plan.objectives.len() - 1)
                    } else {
                        NodeRole::None
                    }
                }
                _ => NodeRole::None,
            }
        };
        plan.roles[id.index()] = role;
    }

    tracing::debug!(
        objectives = plan.objectives.len(),
        sources = plan.sources.len(),
        capacity = plan.total_capacity(),
        "Generated objectives"
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, RoutePolicy};
    use crate::world::{Bomb, Factory, Troop};

    fn board() -> DistanceService {
        let links = vec![
            Link::new(0, 1, 3),
            Link::new(0, 2, 5),
            Link::new(1, 2, 4),
            Link::new(0, 3, 2),
            Link::new(1, 3, 4),
            Link::new(2, 3, 6),
        ];
        DistanceService::new(4, &links, RoutePolicy::Direct)
    }

    fn world() -> WorldState {
        let mut world = WorldState::new(4);
        world.set_factory(Factory::new(FactoryId(0)).with_owner(Owner::Me).with_cyborgs(20).with_production(2));
        world.set_factory(Factory::new(FactoryId(1)).with_cyborgs(4).with_production(1));
        world.set_factory(Factory::new(FactoryId(2)).with_owner(Owner::Enemy).with_cyborgs(10).with_production(3));
        world.set_factory(Factory::new(FactoryId(3)).with_cyborgs(1).with_production(0));
        world
    }

    #[test]
    fn test_production_tiers_are_stepped() {
        let value = ValueConfig::default();
        assert_eq!(production_value(0, &value), 0.0);
        assert_eq!(production_value(1, &value), 4.0);
        assert_eq!(production_value(2, &value), 7.0);
        assert_eq!(production_value(3, &value), 10.0);
        assert_eq!(production_value(9, &value), 10.0);
    }

    #[test]
    fn test_roles_are_unique() {
        let graph = board();
        let plan = generate_objectives(&world(), &graph, &PlannerConfig::default());

        assert_eq!(plan.roles.len(), 4);
        assert_eq!(plan.roles[0], NodeRole::Source(0));
        assert!(matches!(plan.roles[1], NodeRole::Objective(_)));
        assert!(matches!(plan.roles[2], NodeRole::Objective(_)));
        // Production 0 is worth nothing
        assert_eq!(plan.roles[3], NodeRole::None);

        let mut targets: Vec<FactoryId> = plan.objectives.iter().map(|o| o.target).collect();
        targets.dedup();
        assert_eq!(targets.len(), plan.objectives.len());
    }

    #[test]
    fn test_capture_objective_values() {
        let graph = board();
        let plan = generate_objectives(&world(), &graph, &PlannerConfig::default());

        let neutral = plan.objectives.iter().find(|o| o.target == FactoryId(1)).unwrap();
        assert_eq!(neutral.kind, ObjectiveKind::Capture);
        assert_eq!(neutral.need, 4 + 2 + 1);
        assert_eq!(neutral.deadline, 3);
        // The enemy needs four turns to reach 1, we need three
        assert!(!neutral.contested);

        let enemy = plan.objectives.iter().find(|o| o.target == FactoryId(2)).unwrap();
        assert!(enemy.contested);
        assert_eq!(enemy.need, 10 + 3 * 5 + 2 * 3 + 1);
        assert_eq!(plan.sources[0].available, 20 - 2);
    }

    #[test]
    fn test_defend_objective_replaces_source() {
        let graph = board();
        let mut world = world();
        world.add_troop(Troop {
            id: 50,
            owner: Owner::Enemy,
            origin: FactoryId(2),
            destination: FactoryId(0),
            cyborgs: 30,
            turns_remaining: 5,
        });
        let plan = generate_objectives(&world, &graph, &PlannerConfig::default());

        assert!(plan.sources.is_empty());
        let NodeRole::Objective(index) = plan.roles[0] else {
            panic!("expected defend objective");
        };
        let defend = &plan.objectives[index];
        assert_eq!(defend.kind, ObjectiveKind::Defend);
        assert_eq!(defend.deadline, 5);
        // 20 + 2 * 5 - 30 = 0 -> shortfall 1, need 2
        assert_eq!(defend.need, 2);
    }

    #[test]
    fn test_drop_objective_reindexes_roles() {
        let graph = board();
        let mut plan = generate_objectives(&world(), &graph, &PlannerConfig::default());
        let NodeRole::Objective(first) = plan.roles[1] else {
            panic!("expected capture objective on 1");
        };
        assert_eq!(first, 0);

        assert!(plan.drop_objective(FactoryId(1)));
        assert!(!plan.drop_objective(FactoryId(1)));
        assert_eq!(plan.roles[1], NodeRole::None);
        assert_eq!(plan.roles[2], NodeRole::Objective(0));
        assert_eq!(plan.objectives[0].target, FactoryId(2));
    }

    #[test]
    fn test_own_bomb_boosts_target() {
        let graph = board();
        let config = PlannerConfig::default();
        let base = generate_objectives(&world(), &graph, &config);

        let mut bombed_world = world();
        bombed_world.add_bomb(Bomb {
            id: 60,
            owner: Owner::Me,
            origin: FactoryId(0),
            target: Some(FactoryId(2)),
            turns_remaining: Some(5),
        });
        let bombed = generate_objectives(&bombed_world, &graph, &config);

        let score = |plan: &ObjectivePlan| {
            plan.objectives
                .iter()
                .find(|o| o.target == FactoryId(2))
                .map(|o| o.score)
                .unwrap()
        };
        assert!((score(&bombed) - score(&base) * config.value.bomb_bonus).abs() < 1e-9);
    }
}
