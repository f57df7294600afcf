//! Line protocol codec
//!
//! Startup:
//! ```text
//! <factoryCount>
//! <linkCount>
//! <factory1> <factory2> <distance>      (linkCount lines)
//! ```
//! Every turn:
//! ```text
//! <entityCount>
//! <id> <FACTORY|TROOP|BOMB> <arg1> <arg2> <arg3> <arg4> [<arg5>]
//! ```
//! A turn is parsed all-or-nothing: every line of the turn is consumed before
//! the first error is reported, so the reader stays aligned for the next turn.

use std::io::BufRead;

use crate::core::error::{PlannerError, Result};
use crate::core::types::{FactoryId, Owner};
use crate::graph::{DistanceService, Link, RoutePolicy};
use crate::world::entity::{Bomb, EntityUpdate, Factory, Troop};

/// Read one line, failing with `EndOfInput` at EOF
pub fn next_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(PlannerError::EndOfInput);
    }
    Ok(line.trim().to_string())
}

fn parse_int(line: &str, token: Option<&str>, what: &str) -> Result<i64> {
    let token = token.ok_or_else(|| PlannerError::malformed(line, format!("missing {what}")))?;
    token
        .parse::<i64>()
        .map_err(|_| PlannerError::malformed(line, format!("{what} is not an integer: {token}")))
}

fn parse_count(line: &str) -> Result<usize> {
    let value = parse_int(line, line.split_whitespace().next(), "count")?;
    usize::try_from(value).map_err(|_| PlannerError::malformed(line, "negative count"))
}

fn to_factory(value: i64) -> Result<FactoryId> {
    usize::try_from(value)
        .map(FactoryId)
        .map_err(|_| PlannerError::FactoryOutOfRange { id: value, count: 0 })
}

fn to_owner(line: &str, value: i64) -> Result<Owner> {
    i32::try_from(value)
        .ok()
        .and_then(Owner::from_protocol)
        .ok_or_else(|| PlannerError::malformed(line, format!("unknown owner {value}")))
}

fn to_i32(line: &str, value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| PlannerError::malformed(line, "value out of range"))
}

/// Parse a `<factory1> <factory2> <distance>` link line
pub fn parse_link(line: &str) -> Result<Link> {
    let mut tokens = line.split_whitespace();
    let a = parse_int(line, tokens.next(), "factory1")?;
    let b = parse_int(line, tokens.next(), "factory2")?;
    let distance = parse_int(line, tokens.next(), "distance")?;
    Ok(Link {
        a: to_factory(a)?,
        b: to_factory(b)?,
        distance: to_i32(line, distance)?,
    })
}

/// Parse one entity line of a turn
pub fn parse_entity(line: &str) -> Result<EntityUpdate> {
    let mut tokens = line.split_whitespace();
    let id = parse_int(line, tokens.next(), "entity id")?;
    let kind = tokens
        .next()
        .ok_or_else(|| PlannerError::malformed(line, "missing entity type"))?;
    let mut args = [0i64; 5];
    let mut present = 0;
    for (slot, token) in args.iter_mut().zip(tokens.by_ref()) {
        *slot = parse_int(line, Some(token), "argument")?;
        present += 1;
    }
    if tokens.next().is_some() {
        return Err(PlannerError::malformed(line, "too many arguments"));
    }
    if present < 4 {
        return Err(PlannerError::malformed(line, "expected at least 4 arguments"));
    }

    let id = to_i32(line, id)?;
    match kind {
        "FACTORY" => Ok(EntityUpdate::Factory(
            Factory::new(to_factory(i64::from(id))?)
                .with_owner(to_owner(line, args[0])?)
                .with_cyborgs(to_i32(line, args[1])?)
                .with_production(to_i32(line, args[2])?)
                .with_disabled_turns(to_i32(line, args[3])?),
        )),
        "TROOP" => {
            if present < 5 {
                return Err(PlannerError::malformed(line, "troop needs 5 arguments"));
            }
            Ok(EntityUpdate::Troop(Troop {
                id,
                owner: to_owner(line, args[0])?,
                origin: to_factory(args[1])?,
                destination: to_factory(args[2])?,
                cyborgs: to_i32(line, args[3])?,
                turns_remaining: to_i32(line, args[4])?,
            }))
        }
        "BOMB" => Ok(EntityUpdate::Bomb(Bomb {
            id,
            owner: to_owner(line, args[0])?,
            origin: to_factory(args[1])?,
            target: (args[2] >= 0).then(|| to_factory(args[2])).transpose()?,
            turns_remaining: (args[3] >= 0).then(|| to_i32(line, args[3])).transpose()?,
        })),
        other => Err(PlannerError::UnknownEntityType(other.to_string())),
    }
}

/// Read the startup block and precompute the distance service
pub fn read_initialization<R: BufRead>(reader: &mut R, policy: RoutePolicy) -> Result<DistanceService> {
    let node_count = parse_count(&next_line(reader)?)?;
    let link_count = parse_count(&next_line(reader)?)?;
    let mut links = Vec::with_capacity(link_count);
    for _ in 0..link_count {
        let link = parse_link(&next_line(reader)?)?;
        for id in [link.a, link.b] {
            if id.index() >= node_count {
                return Err(PlannerError::FactoryOutOfRange {
                    id: id.index() as i64,
                    count: node_count,
                });
            }
        }
        links.push(link);
    }
    Ok(DistanceService::new(node_count, &links, policy))
}

/// Read one turn of entity lines
pub fn read_turn<R: BufRead>(reader: &mut R) -> Result<Vec<EntityUpdate>> {
    let entity_count = parse_count(&next_line(reader)?)?;
    let mut lines = Vec::with_capacity(entity_count);
    for _ in 0..entity_count {
        lines.push(next_line(reader)?);
    }
    lines.iter().map(|line| parse_entity(line)).collect()
}

/// Render the startup block
pub fn render_initialization(node_count: usize, links: &[Link]) -> String {
    let mut out = format!("{}\n{}\n", node_count, links.len());
    for link in links {
        out.push_str(&format!("{} {} {}\n", link.a, link.b, link.distance));
    }
    out
}

/// Render an entity the way the referee prints it
pub fn render_entity(update: &EntityUpdate) -> String {
    match update {
        EntityUpdate::Factory(f) => format!(
            "{} FACTORY {} {} {} {} 0",
            f.id,
            f.owner.to_protocol(),
            f.cyborgs,
            f.production,
            f.disabled_turns
        ),
        EntityUpdate::Troop(t) => format!(
            "{} TROOP {} {} {} {} {}",
            t.id,
            t.owner.to_protocol(),
            t.origin,
            t.destination,
            t.cyborgs,
            t.turns_remaining
        ),
        EntityUpdate::Bomb(b) => format!(
            "{} BOMB {} {} {} {} 0",
            b.id,
            b.owner.to_protocol(),
            b.origin,
            b.target.map_or(-1, |t| t.index() as i64),
            b.turns_remaining.unwrap_or(-1)
        ),
    }
}

/// Render a whole turn, count line included
pub fn render_turn(updates: &[EntityUpdate]) -> String {
    let mut out = format!("{}\n", updates.len());
    for update in updates {
        out.push_str(&render_entity(update));
        out.push('\n');
    }
    out
}
