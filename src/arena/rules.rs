//! Referee rules
//!
//! The game state is kept in the absolute frame: `Owner::Me` is the first
//! seat and `Owner::Enemy` the second. Each seat gets the board rendered from
//! its own point of view.

use serde::{Deserialize, Serialize};

use crate::arena::mapgen::GeneratedMap;
use crate::core::types::{Cyborgs, Distance, FactoryId, Owner, Turn, MAX_PRODUCTION};
use crate::graph::{DistanceService, Link, RoutePolicy};
use crate::planner::command::Command;
use crate::world::protocol::{render_initialization, render_turn};
use crate::world::{Bomb, EntityUpdate, Factory, Troop};

/// Cyborgs consumed by INC
pub const INC_COST: Cyborgs = 10;
/// Bombs per seat for the whole game
pub const BOMBS_PER_SEAT: u32 = 2;
/// Turns a bombed factory stops producing
pub const BOMB_DISABLE_TURNS: i32 = 5;
/// Least a bomb destroys
pub const BOMB_MIN_DAMAGE: Cyborgs = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub const BOTH: [Seat; 2] = [Seat::First, Seat::Second];

    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Owner value this seat has in the absolute frame
    pub fn owner(self) -> Owner {
        match self {
            Self::First => Owner::Me,
            Self::Second => Owner::Enemy,
        }
    }

    /// How an absolute owner reads from this seat
    pub fn view(self, owner: Owner) -> Owner {
        match self {
            Self::First => owner,
            Self::Second => owner.opposite(),
        }
    }

    fn from_owner(owner: Owner) -> Option<Self> {
        match owner {
            Owner::Me => Some(Self::First),
            Owner::Enemy => Some(Self::Second),
            Owner::Neutral => None,
        }
    }
}

/// Per-seat counters for the match report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatTally {
    pub orders: usize,
    pub rejected: usize,
    pub bombs: u32,
    pub incs: u32,
    pub captures: u32,
}

#[derive(Debug, Clone)]
pub struct Game {
    graph: DistanceService,
    links: Vec<Link>,
    factories: Vec<Factory>,
    troops: Vec<Troop>,
    bombs: Vec<Bomb>,
    next_entity_id: i32,
    turn: Turn,
    max_turns: Turn,
    bombs_left: [u32; 2],
    tally: [SeatTally; 2],
}

impl Game {
    pub fn new(map: GeneratedMap, max_turns: Turn) -> Self {
        let node_count = map.node_count();
        let graph = DistanceService::new(node_count, &map.links, RoutePolicy::Direct);
        Self {
            graph,
            links: map.links,
            factories: map.factories,
            troops: Vec::new(),
            bombs: Vec::new(),
            next_entity_id: node_count as i32,
            turn: 0,
            max_turns,
            bombs_left: [BOMBS_PER_SEAT; 2],
            tally: [SeatTally::default(); 2],
        }
    }

    pub fn turn(&self) -> Turn {
        self.turn
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

    pub fn tally(&self, seat: Seat) -> SeatTally {
        self.tally[seat.index()]
    }

    /// Startup block, identical for both seats
    pub fn initialization_text(&self) -> String {
        render_initialization(self.factories.len(), &self.links)
    }

    /// This turn's entity block as `seat` sees it
    pub fn turn_text(&self, seat: Seat) -> String {
        let mut updates = Vec::with_capacity(self.factories.len() + self.troops.len() + self.bombs.len());
        for factory in &self.factories {
            let mut factory = factory.clone();
            factory.owner = seat.view(factory.owner);
            updates.push(EntityUpdate::Factory(factory));
        }
        for troop in &self.troops {
            let mut troop = troop.clone();
            troop.owner = seat.view(troop.owner);
            updates.push(EntityUpdate::Troop(troop));
        }
        for bomb in &self.bombs {
            let mut bomb = bomb.clone();
            if bomb.owner != seat.owner() {
                bomb.target = None;
                bomb.turns_remaining = None;
            }
            bomb.owner = seat.view(bomb.owner);
            updates.push(EntityUpdate::Bomb(bomb));
        }
        render_turn(&updates)
    }

    /// Cyborgs a seat holds, in factories and in flight
    pub fn cyborgs(&self, seat: Seat) -> Cyborgs {
        let owner = seat.owner();
        let garrisons: Cyborgs = self.factories.iter().filter(|f| f.owner == owner).map(|f| f.cyborgs).sum();
        let flying: Cyborgs = self.troops.iter().filter(|t| t.owner == owner).map(|t| t.cyborgs).sum();
        garrisons + flying
    }

    pub fn production(&self, seat: Seat) -> i32 {
        self.factories
            .iter()
            .filter(|f| f.owner == seat.owner())
            .map(|f| f.production)
            .sum()
    }

    pub fn factories_owned(&self, seat: Seat) -> usize {
        self.factories.iter().filter(|f| f.owner == seat.owner()).count()
    }

    fn eliminated(&self, seat: Seat) -> bool {
        let owner = seat.owner();
        !self.factories.iter().any(|f| f.owner == owner) && !self.troops.iter().any(|t| t.owner == owner)
    }

    pub fn is_over(&self) -> bool {
        self.turn >= self.max_turns || Seat::BOTH.iter().any(|&s| self.eliminated(s))
    }

    /// Seat ahead on cyborgs once the game is over, `None` on a draw
    pub fn winner(&self) -> Option<Seat> {
        let (first, second) = (self.cyborgs(Seat::First), self.cyborgs(Seat::Second));
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Some(Seat::First),
            std::cmp::Ordering::Less => Some(Seat::Second),
            std::cmp::Ordering::Equal => None,
        }
    }

    fn travel_time(&self, from: FactoryId, to: FactoryId) -> Distance {
        self.graph
            .link(from, to)
            .unwrap_or_else(|| self.graph.distance(from, to))
            .max(1)
    }

    fn next_id(&mut self) -> i32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Apply one order for `seat`; false when the order is not legal
    ///
    /// Factory ids in orders are the seat's own, which are absolute ids
    /// because only owners are mirrored.
    fn execute(&mut self, seat: Seat, command: &Command) -> bool {
        let owner = seat.owner();
        let node_count = self.factories.len();
        let owns = |factories: &[Factory], id: FactoryId| id.index() < node_count && factories[id.index()].owner == owner;

        match *command {
            Command::Wait | Command::Msg(_) => true,
            Command::Move { from, to, cyborgs } => {
                if !owns(&self.factories, from) || to.index() >= node_count || from == to || cyborgs <= 0 {
                    return false;
                }
                let sent = cyborgs.min(self.factories[from.index()].cyborgs);
                if sent == 0 {
                    return true;
                }
                self.factories[from.index()].cyborgs -= sent;
                let id = self.next_id();
                let turns_remaining = self.travel_time(from, to);
                self.troops.push(Troop {
                    id,
                    owner,
                    origin: from,
                    destination: to,
                    cyborgs: sent,
                    turns_remaining,
                });
                true
            }
            Command::Bomb { from, to } => {
                if !owns(&self.factories, from) || to.index() >= node_count || from == to || self.bombs_left[seat.index()] == 0 {
                    return false;
                }
                self.bombs_left[seat.index()] -= 1;
                self.tally[seat.index()].bombs += 1;
                let id = self.next_id();
                let turns_remaining = self.travel_time(from, to);
                self.bombs.push(Bomb {
                    id,
                    owner,
                    origin: from,
                    target: Some(to),
                    turns_remaining: Some(turns_remaining),
                });
                true
            }
            Command::Inc { factory } => {
                if !owns(&self.factories, factory) {
                    return false;
                }
                let target = &mut self.factories[factory.index()];
                if target.production >= MAX_PRODUCTION || target.cyborgs < INC_COST {
                    return false;
                }
                target.cyborgs -= INC_COST;
                target.production += 1;
                self.tally[seat.index()].incs += 1;
                true
            }
        }
    }

    /// Advance the game by one turn with both seats' orders
    pub fn step(&mut self, orders: [&[Command]; 2]) {
        for troop in &mut self.troops {
            troop.turns_remaining -= 1;
        }
        for bomb in &mut self.bombs {
            if let Some(turns) = bomb.turns_remaining.as_mut() {
                *turns -= 1;
            }
        }
        for factory in &mut self.factories {
            factory.disabled_turns = (factory.disabled_turns - 1).max(0);
        }

        for seat in Seat::BOTH {
            for command in orders[seat.index()] {
                self.tally[seat.index()].orders += 1;
                if !self.execute(seat, command) {
                    self.tally[seat.index()].rejected += 1;
                    tracing::debug!(?seat, %command, "Rejected order");
                }
            }
        }

        for factory in &mut self.factories {
            if factory.owner.is_player() && !factory.is_disabled() {
                factory.cyborgs += factory.production;
            }
        }

        self.resolve_battles();
        self.detonate_bombs();
        self.turn += 1;
    }

    fn resolve_battles(&mut self) {
        let mut arrivals = vec![[0 as Cyborgs; 2]; self.factories.len()];
        self.troops.retain(|troop| {
            if troop.turns_remaining > 0 {
                return true;
            }
            if let Some(seat) = Seat::from_owner(troop.owner) {
                arrivals[troop.destination.index()][seat.index()] += troop.cyborgs;
            }
            false
        });

        for (factory, [mut first, mut second]) in self.factories.iter_mut().zip(arrivals) {
            let clash = first.min(second);
            first -= clash;
            second -= clash;
            for (seat, arriving) in [(Seat::First, first), (Seat::Second, second)] {
                if arriving == 0 {
                    continue;
                }
                if factory.owner == seat.owner() {
                    factory.cyborgs += arriving;
                } else {
                    factory.cyborgs -= arriving;
                    if factory.cyborgs < 0 {
                        factory.owner = seat.owner();
                        factory.cyborgs = -factory.cyborgs;
                        self.tally[seat.index()].captures += 1;
                    }
                }
            }
        }
    }

    fn detonate_bombs(&mut self) {
        let factories = &mut self.factories;
        self.bombs.retain(|bomb| {
            let (Some(target), Some(turns)) = (bomb.target, bomb.turns_remaining) else {
                return false;
            };
            if turns > 0 {
                return true;
            }
            let factory = &mut factories[target.index()];
            let destroyed = BOMB_MIN_DAMAGE.max(factory.cyborgs / 2).min(factory.cyborgs);
            factory.cyborgs -= destroyed;
            factory.disabled_turns = BOMB_DISABLE_TURNS;
            false
        });
    }
}
