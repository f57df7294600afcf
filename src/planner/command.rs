//! Output commands and the move emitter
//!
//! The winning group becomes one MOVE per (origin, destination) pair. With
//! hop-by-hop routing the destination is the next factory on the route, so
//! long trips are re-planned every turn, and only stop over at factories we
//! own. Whatever capacity the group leaves unused is pushed toward the
//! nearest enemy factory that no bomb is about to hit.

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::ActionConfig;
use crate::core::error::PlannerError;
use crate::core::types::{Cyborgs, FactoryId, Owner};
use crate::graph::DistanceService;
use crate::planner::assignment::{bomb_in_the_way, CandidateSet};
use crate::planner::objective::CapacitySource;
use crate::planner::selection::Selection;
use crate::world::WorldState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Wait,
    Move {
        from: FactoryId,
        to: FactoryId,
        cyborgs: Cyborgs,
    },
    Bomb {
        from: FactoryId,
        to: FactoryId,
    },
    Inc {
        factory: FactoryId,
    },
    Msg(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => write!(f, "WAIT"),
            Self::Move { from, to, cyborgs } => write!(f, "MOVE {from} {to} {cyborgs}"),
            Self::Bomb { from, to } => write!(f, "BOMB {from} {to}"),
            Self::Inc { factory } => write!(f, "INC {factory}"),
            Self::Msg(text) => write!(f, "MSG {text}"),
        }
    }
}

fn parse_factory(text: &str, token: Option<&str>) -> Result<FactoryId, PlannerError> {
    token
        .and_then(|t| t.parse::<usize>().ok())
        .map(FactoryId)
        .ok_or_else(|| PlannerError::InvalidCommand(text.to_string()))
}

impl FromStr for Command {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let mut tokens = text.split_whitespace();
        let invalid = || PlannerError::InvalidCommand(text.to_string());
        let command = match tokens.next().ok_or_else(invalid)? {
            "WAIT" => Self::Wait,
            "MOVE" => {
                let from = parse_factory(text, tokens.next())?;
                let to = parse_factory(text, tokens.next())?;
                let cyborgs = tokens
                    .next()
                    .and_then(|t| t.parse::<Cyborgs>().ok())
                    .ok_or_else(invalid)?;
                Self::Move { from, to, cyborgs }
            }
            "BOMB" => Self::Bomb {
                from: parse_factory(text, tokens.next())?,
                to: parse_factory(text, tokens.next())?,
            },
            "INC" => Self::Inc {
                factory: parse_factory(text, tokens.next())?,
            },
            "MSG" => {
                let message = text.strip_prefix("MSG").unwrap_or_default().trim();
                return Ok(Self::Msg(message.to_string()));
            }
            _ => return Err(invalid()),
        };
        if tokens.next().is_some() {
            return Err(invalid());
        }
        Ok(command)
    }
}

/// Join commands into one output line; an empty turn is `WAIT`
pub fn render_commands(commands: &[Command]) -> String {
    if commands.is_empty() {
        return Command::Wait.to_string();
    }
    commands
        .iter()
        .map(Command::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a `;`-joined output line, keeping the commands that parse
pub fn parse_commands(line: &str) -> (Vec<Command>, Vec<PlannerError>) {
    let mut commands = Vec::new();
    let mut errors = Vec::new();
    for part in line.split(';').filter(|p| !p.trim().is_empty()) {
        match part.parse::<Command>() {
            Ok(command) => commands.push(command),
            Err(e) => errors.push(e),
        }
    }
    (commands, errors)
}

/// Accumulates moves, merging repeated (origin, destination) pairs
#[derive(Debug, Default)]
struct MoveBook {
    order: Vec<(FactoryId, FactoryId)>,
    quantities: AHashMap<(FactoryId, FactoryId), Cyborgs>,
}

impl MoveBook {
    fn add(&mut self, from: FactoryId, to: FactoryId, cyborgs: Cyborgs) {
        if from == to || cyborgs <= 0 {
            return;
        }
        let entry = self.quantities.entry((from, to)).or_insert_with(|| {
            self.order.push((from, to));
            0
        });
        *entry = entry.saturating_add(cyborgs);
    }

    fn into_commands(self) -> Vec<Command> {
        let Self { order, quantities } = self;
        order
            .into_iter()
            .map(|(from, to)| Command::Move {
                from,
                to,
                cyborgs: quantities.get(&(from, to)).copied().unwrap_or(0),
            })
            .collect()
    }
}

/// Where to send troops bound for `target` this turn
///
/// Troops arriving at a neutral or enemy factory fight there, so a stopover
/// must be a factory we own. Without one they go straight to the target.
fn destination(
    world: &WorldState,
    graph: &DistanceService,
    from: FactoryId,
    target: FactoryId,
    config: &ActionConfig,
) -> FactoryId {
    if !config.hop_by_hop {
        return target;
    }
    let safe = |hop: FactoryId| hop == target || world.factory(hop).owner == Owner::Me;
    match graph.next_hop(from, target) {
        Some(hop) if safe(hop) => hop,
        _ => graph
            .shortest_hops(from, target)
            .into_iter()
            .find(|&hop| safe(hop))
            .unwrap_or(target),
    }
}

/// Turn the winning group and leftover capacity into MOVE commands
///
/// `bombing` lists the factories our bombs were launched at this turn; mop-up
/// never follows them in.
pub fn emit_moves(
    selection: Option<&Selection>,
    candidates: &CandidateSet,
    sources: &[CapacitySource],
    world: &WorldState,
    graph: &DistanceService,
    config: &ActionConfig,
    bombing: &[FactoryId],
) -> Vec<Command> {
    let mut book = MoveBook::default();
    let mut spent: AHashMap<FactoryId, Cyborgs> = AHashMap::new();

    if let Some(selection) = selection {
        for &member in &selection.members {
            let assignment = &candidates.assignments[member];
            let to = destination(world, graph, assignment.origin, assignment.target, config);
            book.add(assignment.origin, to, assignment.quantity);
            let drawn = spent.entry(assignment.origin).or_insert(0);
            *drawn = drawn.saturating_add(assignment.quantity);
        }
    }

    if config.mop_up {
        let enemies = world.owned_ids(Owner::Enemy);
        for source in sources {
            let left = source.available - spent.get(&source.factory).copied().unwrap_or(0);
            if left <= 0 {
                continue;
            }
            let open = enemies.iter().copied().filter(|&enemy| {
                !bombing.contains(&enemy)
                    && !bomb_in_the_way(world, enemy, graph.distance(source.factory, enemy))
            });
            if let Some(target) = graph.nearest(source.factory, open) {
                let to = destination(world, graph, source.factory, target, config);
                tracing::trace!(from = %source.factory, %to, left, "Mop-up move");
                book.add(source.factory, to, left);
            }
        }
    }

    book.into_commands()
}
