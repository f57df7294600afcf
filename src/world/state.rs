//! Per-turn world snapshot
//!
//! Factories persist for the whole game and are updated in place; troops and
//! bombs are rebuilt from scratch every turn.

use crate::core::error::{PlannerError, Result};
use crate::core::types::{Cyborgs, FactoryId, Owner, MAX_DISTANCE};
use crate::graph::DistanceService;
use crate::world::entity::{Bomb, EntityUpdate, Factory, Troop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldState {
    factories: Vec<Factory>,
    troops: Vec<Troop>,
    bombs: Vec<Bomb>,
}

impl WorldState {
    /// Create a board of neutral, empty factories
    pub fn new(node_count: usize) -> Self {
        Self {
            factories: (0..node_count).map(|i| Factory::new(FactoryId(i))).collect(),
            troops: Vec::new(),
            bombs: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.factories.len()
    }

    /// Replace the turn snapshot with a fresh set of entity updates
    ///
    /// Every id is checked before anything is mutated, so a rejected turn
    /// leaves the previous snapshot untouched.
    pub fn apply_turn(&mut self, updates: Vec<EntityUpdate>) -> Result<()> {
        for update in &updates {
            match update {
                EntityUpdate::Factory(factory) => self.check_id(factory.id)?,
                EntityUpdate::Troop(troop) => {
                    self.check_id(troop.origin)?;
                    self.check_id(troop.destination)?;
                }
                EntityUpdate::Bomb(bomb) => {
                    self.check_id(bomb.origin)?;
                    if let Some(target) = bomb.target {
                        self.check_id(target)?;
                    }
                }
            }
        }

        self.troops.clear();
        self.bombs.clear();
        for update in updates {
            match update {
                EntityUpdate::Factory(factory) => {
                    let index = factory.id.index();
                    self.factories[index] = factory;
                }
                EntityUpdate::Troop(troop) => self.troops.push(troop),
                EntityUpdate::Bomb(bomb) => self.bombs.push(bomb),
            }
        }
        Ok(())
    }

    fn check_id(&self, id: FactoryId) -> Result<()> {
        if id.index() < self.factories.len() {
            Ok(())
        } else {
            Err(PlannerError::FactoryOutOfRange {
                id: id.index() as i64,
                count: self.factories.len(),
            })
        }
    }

    pub fn set_factory(&mut self, factory: Factory) {
        let index = factory.id.index();
        self.factories[index] = factory;
    }

    pub fn add_troop(&mut self, troop: Troop) {
        self.troops.push(troop);
    }

    pub fn add_bomb(&mut self, bomb: Bomb) {
        self.bombs.push(bomb);
    }

    pub fn factory(&self, id: FactoryId) -> &Factory {
        &self.factories[id.index()]
    }

    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    pub fn troops(&self) -> &[Troop] {
        &self.troops
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    /// Factories currently held by `owner`
    pub fn owned_nodes(&self, owner: Owner) -> impl Iterator<Item = &Factory> + '_ {
        self.factories.iter().filter(move |f| f.owner == owner)
    }

    pub fn owned_ids(&self, owner: Owner) -> Vec<FactoryId> {
        self.owned_nodes(owner).map(|f| f.id).collect()
    }

    pub fn troops_targeting(&self, id: FactoryId) -> impl Iterator<Item = &Troop> + '_ {
        self.troops.iter().filter(move |t| t.destination == id)
    }

    /// Bombs known to be heading for `id` (only our own bombs expose a target)
    pub fn bombs_targeting(&self, id: FactoryId) -> impl Iterator<Item = &Bomb> + '_ {
        self.bombs.iter().filter(move |b| b.target == Some(id))
    }

    /// Mean distance from `id` to the other factories of `owner` producing at
    /// least `min_production`
    ///
    /// Returns `MAX_DISTANCE` when no such factory exists so isolated targets
    /// are penalised instead of dividing by zero.
    pub fn average_distance(
        &self,
        graph: &DistanceService,
        id: FactoryId,
        owner: Owner,
        min_production: i32,
    ) -> f64 {
        let (total, count) = self
            .owned_nodes(owner)
            .filter(|f| f.id != id && f.production >= min_production)
            .filter(|f| graph.is_reachable(id, f.id))
            .fold((0i64, 0u32), |(total, count), f| {
                (total + i64::from(graph.distance(id, f.id)), count + 1)
            });
        if count == 0 {
            f64::from(MAX_DISTANCE)
        } else {
            total as f64 / f64::from(count)
        }
    }

    /// Factories of `owner` ordered by distance from `origin`, ties in id order
    pub fn factories_sorted_by_distance(
        &self,
        graph: &DistanceService,
        origin: FactoryId,
        owner: Owner,
    ) -> Vec<FactoryId> {
        let mut ids: Vec<FactoryId> = self
            .owned_nodes(owner)
            .map(|f| f.id)
            .filter(|&id| id != origin)
            .collect();
        graph.sort_by_distance(origin, &mut ids);
        ids
    }

    /// Cyborgs held by `owner`, garrisons plus troops in flight
    pub fn total_cyborgs(&self, owner: Owner) -> Cyborgs {
        let garrisons = self
            .owned_nodes(owner)
            .fold(0, |total: Cyborgs, f| total.saturating_add(f.cyborgs));
        self.troops
            .iter()
            .filter(|t| t.owner == owner)
            .fold(garrisons, |total, t| total.saturating_add(t.cyborgs))
    }

    pub fn total_production(&self, owner: Owner) -> i32 {
        self.owned_nodes(owner).map(|f| f.production).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, RoutePolicy};

    fn line_graph() -> DistanceService {
        let links = vec![Link::new(0, 1, 2), Link::new(1, 2, 4), Link::new(0, 2, 6)];
        DistanceService::new(3, &links, RoutePolicy::Direct)
    }

    fn troop(owner: Owner, destination: usize, cyborgs: Cyborgs) -> Troop {
        Troop {
            id: 10,
            owner,
            origin: FactoryId(0),
            destination: FactoryId(destination),
            cyborgs,
            turns_remaining: 2,
        }
    }

    #[test]
    fn test_apply_turn_rebuilds_troops() {
        let mut world = WorldState::new(3);
        world
            .apply_turn(vec![
                EntityUpdate::Factory(Factory::new(FactoryId(1)).with_owner(Owner::Me).with_cyborgs(5)),
                EntityUpdate::Troop(troop(Owner::Enemy, 1, 4)),
            ])
            .unwrap();
        assert_eq!(world.troops().len(), 1);
        assert_eq!(world.factory(FactoryId(1)).owner, Owner::Me);

        world.apply_turn(vec![]).unwrap();
        assert!(world.troops().is_empty());
        // Factories persist between turns
        assert_eq!(world.factory(FactoryId(1)).cyborgs, 5);
    }

    #[test]
    fn test_apply_turn_rejects_bad_id_without_mutation() {
        let mut world = WorldState::new(2);
        world.add_troop(troop(Owner::Me, 1, 3));
        let result = world.apply_turn(vec![
            EntityUpdate::Factory(Factory::new(FactoryId(0)).with_owner(Owner::Me)),
            EntityUpdate::Factory(Factory::new(FactoryId(5))),
        ]);
        assert!(matches!(result, Err(PlannerError::FactoryOutOfRange { id: 5, count: 2 })));
        assert_eq!(world.troops().len(), 1);
        assert_eq!(world.factory(FactoryId(0)).owner, Owner::Neutral);
    }

    #[test]
    fn test_targeting_queries() {
        let mut world = WorldState::new(3);
        world.add_troop(troop(Owner::Enemy, 1, 4));
        world.add_troop(troop(Owner::Me, 2, 4));
        world.add_bomb(Bomb {
            id: 20,
            owner: Owner::Enemy,
            origin: FactoryId(2),
            target: None,
            turns_remaining: None,
        });
        world.add_bomb(Bomb {
            id: 21,
            owner: Owner::Me,
            origin: FactoryId(0),
            target: Some(FactoryId(1)),
            turns_remaining: Some(2),
        });
        assert_eq!(world.troops_targeting(FactoryId(1)).count(), 1);
        assert_eq!(world.bombs_targeting(FactoryId(1)).count(), 1);
        assert_eq!(world.bombs_targeting(FactoryId(2)).count(), 0);
    }

    #[test]
    fn test_average_distance() {
        let graph = line_graph();
        let mut world = WorldState::new(3);
        world.set_factory(Factory::new(FactoryId(1)).with_owner(Owner::Me).with_production(2));
        world.set_factory(Factory::new(FactoryId(2)).with_owner(Owner::Me).with_production(0));

        assert_eq!(world.average_distance(&graph, FactoryId(0), Owner::Me, 0), 4.0);
        assert_eq!(world.average_distance(&graph, FactoryId(0), Owner::Me, 1), 2.0);
        assert_eq!(
            world.average_distance(&graph, FactoryId(0), Owner::Enemy, 0),
            f64::from(MAX_DISTANCE)
        );
    }

    #[test]
    fn test_sorted_by_distance_and_totals() {
        let graph = line_graph();
        let mut world = WorldState::new(3);
        world.set_factory(Factory::new(FactoryId(1)).with_owner(Owner::Enemy).with_cyborgs(3));
        world.set_factory(Factory::new(FactoryId(2)).with_owner(Owner::Enemy).with_cyborgs(7));
        world.add_troop(troop(Owner::Enemy, 0, 5));

        let sorted = world.factories_sorted_by_distance(&graph, FactoryId(0), Owner::Enemy);
        assert_eq!(sorted, vec![FactoryId(1), FactoryId(2)]);
        assert_eq!(world.total_cyborgs(Owner::Enemy), 15);
        assert_eq!(world.total_cyborgs(Owner::Me), 0);
    }
}
