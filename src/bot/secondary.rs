//! BOMB and INC decisions
//!
//! Both run before the assignment builder. INC is paid from a source's idle
//! capacity, so the cost is taken off the plan before any troops are
//! allocated.

use crate::bot::memory::BotMemory;
use crate::core::config::ActionConfig;
use crate::core::types::{Cyborgs, FactoryId, Owner, MAX_PRODUCTION};
use crate::graph::DistanceService;
use crate::planner::command::Command;
use crate::planner::objective::{ObjectiveKind, ObjectivePlan};
use crate::world::WorldState;

/// Pick an enemy factory worth bombing and the factory to launch from
pub fn choose_bomb(
    world: &WorldState,
    graph: &DistanceService,
    memory: &BotMemory,
    config: &ActionConfig,
) -> Option<(FactoryId, FactoryId)> {
    if memory.bombs_left == 0 {
        return None;
    }
    let home = memory.home;
    let distance_from_home = |id: FactoryId| home.map_or(0, |h| graph.distance(h, id));

    let target = world
        .owned_nodes(Owner::Enemy)
        .filter(|f| f.production >= config.bomb_min_production)
        .filter(|f| !f.is_disabled() && !memory.is_bombed(f.id))
        .filter(|f| !world.bombs_targeting(f.id).any(|b| b.owner == Owner::Me))
        .min_by_key(|f| (-f.production, distance_from_home(f.id), f.id))?;

    let origin = graph.nearest(target.id, world.owned_nodes(Owner::Me).map(|f| f.id))?;
    Some((origin, target.id))
}

/// Upgrade production where there is spare capacity and nothing left to grab
///
/// Returns the INC commands and takes their cost off the plan's sources.
/// Capacity needed to defend our own factories is never spent on upgrades.
pub fn choose_incs(
    plan: &mut ObjectivePlan,
    world: &WorldState,
    graph: &DistanceService,
    config: &ActionConfig,
) -> Vec<Command> {
    let neutral_left = world
        .owned_nodes(Owner::Neutral)
        .any(|f| f.production > 0);
    if neutral_left || config.inc_cost <= 0 {
        return Vec::new();
    }

    // Only defences some source can still reach in time
    let defence_need = plan
        .objectives
        .iter()
        .filter(|o| o.kind == ObjectiveKind::Defend)
        .filter(|o| {
            plan.sources.iter().any(|s| {
                s.factory != o.target
                    && graph.is_reachable(s.factory, o.target)
                    && graph.distance(s.factory, o.target) <= o.deadline
            })
        })
        .fold(0, |total: Cyborgs, o| total.saturating_add(o.need));

    let threshold = config.inc_cost + config.inc_min_surplus;
    let mut commands = Vec::new();
    for index in 0..plan.sources.len() {
        let source = plan.sources[index];
        let factory = world.factory(source.factory);
        let safe = plan.garrison(source.factory).map_or(true, |g| !g.in_danger());
        let spare = plan.total_capacity() - config.inc_cost >= defence_need;
        if factory.production < MAX_PRODUCTION && safe && spare && source.available >= threshold {
            plan.sources[index].available -= config.inc_cost;
            commands.push(Command::Inc {
                factory: source.factory,
            });
        }
    }
    commands
}
