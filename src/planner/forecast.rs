//! Garrison forecasting
//!
//! Owned factories are simulated turn by turn against every troop already in
//! flight toward them. Neutral and enemy factories get a simpler estimate of
//! how many cyborgs a capture needs by the time our nearest troops arrive.

use serde::Serialize;

use crate::core::config::ForecastConfig;
use crate::core::types::{Cyborgs, Distance, FactoryId, Owner};
use crate::graph::DistanceService;
use crate::world::WorldState;

/// Forecast for a factory we own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GarrisonForecast {
    pub factory: FactoryId,
    /// Simulated garrison for turns `0..=horizon`; index 0 is the current garrison
    pub trajectory: Vec<Cyborgs>,
    /// First turn, after a hostile arrival, at which the garrison is at or
    /// below the safety threshold
    pub first_emergency: Option<i32>,
    /// Largest amount missing to stay above the threshold
    pub shortfall: Cyborgs,
    /// Reinforcements requested: shortfall plus a one-cyborg margin
    pub need: Cyborgs,
    /// Cyborgs that can leave this turn without causing an emergency
    pub idle: Cyborgs,
}

impl GarrisonForecast {
    pub fn in_danger(&self) -> bool {
        self.first_emergency.is_some()
    }
}

/// Forecast for a factory we would have to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackForecast {
    pub factory: FactoryId,
    /// Defenders expected when our troops get there, net of our own troops
    /// already on the way
    pub enemies: Cyborgs,
    /// Cyborgs to send to capture and hold the factory
    pub need: Cyborgs,
    /// Turns from our nearest factory
    pub eta: Distance,
    pub nearest_source: FactoryId,
}

impl AttackForecast {
    /// Whether anything still has to be sent
    pub fn takeable(&self) -> bool {
        self.need > 0
    }
}

/// Net friendly (+) and hostile (-) arrivals per turn, plus which turns have
/// any hostile arrival
fn arrival_deltas(world: &WorldState, id: FactoryId, horizon: i32) -> (Vec<Cyborgs>, Vec<bool>) {
    let len = horizon.max(0) as usize + 1;
    let mut deltas: Vec<Cyborgs> = vec![0; len];
    let mut hostile = vec![false; len];
    for troop in world.troops_targeting(id) {
        if troop.turns_remaining > horizon {
            continue;
        }
        let turn = troop.turns_remaining.max(1) as usize;
        match troop.owner {
            Owner::Me => deltas[turn] = deltas[turn].saturating_add(troop.cyborgs),
            _ => {
                deltas[turn] = deltas[turn].saturating_sub(troop.cyborgs);
                hostile[turn] = true;
            }
        }
    }
    (deltas, hostile)
}

/// Simulate an owned factory forward over the configured horizon
///
/// Production is only added while the garrison is non-negative: once the
/// factory would have fallen, the forecast holds the deficit instead of
/// letting it grow, which is what reinforcements arriving in time would
/// have to cover.
pub fn forecast_owned(world: &WorldState, id: FactoryId, config: &ForecastConfig) -> GarrisonForecast {
    let factory = world.factory(id);
    let horizon = config.horizon.max(1);
    let (deltas, hostile) = arrival_deltas(world, id, horizon);

    let mut trajectory = Vec::with_capacity(deltas.len());
    let mut garrison = factory.cyborgs;
    trajectory.push(garrison);
    for (turn, delta) in deltas.iter().enumerate().skip(1) {
        if garrison >= 0 && factory.produces_at(turn as i32) {
            garrison = garrison.saturating_add(factory.production);
        }
        garrison = garrison.saturating_add(*delta);
        trajectory.push(garrison);
    }

    let threshold = config.safety_threshold;
    let mut first_emergency = None;
    let mut shortfall = 0;
    let mut floor_after_contact: Option<Cyborgs> = None;
    let mut contact = false;
    for turn in 1..trajectory.len() {
        contact |= hostile[turn];
        if !contact {
            continue;
        }
        let garrison = trajectory[turn];
        floor_after_contact = Some(floor_after_contact.map_or(garrison, |f| f.min(garrison)));
        if garrison <= threshold {
            first_emergency.get_or_insert(turn as i32);
            shortfall = shortfall.max((threshold + 1).saturating_sub(garrison));
        }
    }

    let need = if shortfall > 0 { shortfall.saturating_add(1) } else { 0 };
    let idle = if first_emergency.is_some() {
        0
    } else {
        let releasable = match floor_after_contact {
            Some(floor) => factory.cyborgs.min(floor.saturating_sub(threshold + 1)),
            None => factory.cyborgs,
        };
        let reserve = config.reserve_production_turns.saturating_mul(factory.production);
        releasable.saturating_sub(reserve).max(0)
    };

    GarrisonForecast {
        factory: id,
        trajectory,
        first_emergency,
        shortfall,
        need,
        idle,
    }
}

/// Estimate what capturing a neutral or enemy factory takes
///
/// Returns `None` when none of our factories can reach it.
pub fn forecast_hostile(
    world: &WorldState,
    graph: &DistanceService,
    id: FactoryId,
    config: &ForecastConfig,
) -> Option<AttackForecast> {
    let factory = world.factory(id);
    let nearest_source = graph.nearest(id, world.owned_nodes(Owner::Me).map(|f| f.id))?;
    let eta = graph.distance(nearest_source, id);

    let mut enemies = factory.cyborgs;
    for troop in world.troops_targeting(id) {
        if troop.turns_remaining > eta {
            continue;
        }
        match troop.owner {
            Owner::Me => enemies = enemies.saturating_sub(troop.cyborgs),
            _ => enemies = enemies.saturating_add(troop.cyborgs),
        }
    }

    // Neutral factories never produce; enemy ones keep growing until we land
    if factory.owner == Owner::Enemy {
        let producing_turns = (eta - factory.disabled_turns).max(0);
        enemies = enemies.saturating_add(factory.production.saturating_mul(producing_turns));
    }

    let need = enemies
        .saturating_add(config.garrison_modifier.saturating_mul(factory.production))
        .saturating_add(1);

    Some(AttackForecast {
        factory: id,
        enemies,
        need,
        eta,
        nearest_source,
    })
}
