//! Local self-play arena
//!
//! A deterministic referee for two bots. Each bot only ever sees protocol
//! text, so a match drives the whole codec as well as the planner.

pub mod mapgen;
pub mod output;
pub mod rules;

pub use mapgen::{generate_map, GeneratedMap, MapConfig};
pub use output::{MatchReport, SeriesReport};
pub use rules::{Game, Seat};

use std::io::Cursor;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bot::Bot;
use crate::core::config::PlannerConfig;
use crate::core::error::Result;
use crate::core::types::Turn;
use crate::graph::DistanceService;
use crate::planner::budget::TurnBudget;
use crate::planner::command::{parse_commands, Command};
use crate::world::protocol::{read_initialization, read_turn};
use crate::world::WorldState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub seed: u64,
    pub max_turns: Turn,
    pub map: MapConfig,
    /// Enforce each bot's wall-clock turn budget; off keeps matches
    /// reproducible on any machine
    pub timed: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_turns: 200,
            map: MapConfig::default(),
            timed: false,
        }
    }
}

/// One bot and the view it builds from protocol text
struct Contestant {
    bot: Bot,
    graph: DistanceService,
    world: WorldState,
    failed_turns: usize,
}

impl Contestant {
    fn join(config: PlannerConfig, initialization: &str) -> Result<Self> {
        let graph = read_initialization(&mut Cursor::new(initialization.as_bytes()), config.actions.route_policy)?;
        let world = WorldState::new(graph.node_count());
        Ok(Self {
            bot: Bot::new(config),
            graph,
            world,
            failed_turns: 0,
        })
    }

    fn respond(&mut self, turn_text: &str, timed: bool) -> String {
        let search = &self.bot.config().search;
        let budget = if timed {
            TurnBudget::from_config(search)
        } else {
            TurnBudget::unlimited_time(search.combination_ceiling)
        };
        let read = read_turn(&mut Cursor::new(turn_text.as_bytes())).and_then(|updates| self.world.apply_turn(updates));
        match read {
            Ok(()) => self.bot.play_turn(&self.graph, &self.world, &budget).render(),
            Err(e) => {
                tracing::warn!(error = %e, "Bot could not read its turn");
                self.failed_turns += 1;
                Command::Wait.to_string()
            }
        }
    }
}

/// Play one match between two planner configurations
pub fn run_match(config: &MatchConfig, planners: [PlannerConfig; 2]) -> Result<MatchReport> {
    let start = Instant::now();
    let map = generate_map(config.seed, &config.map);
    let factories = map.node_count();
    let mut game = Game::new(map, config.max_turns);

    let initialization = game.initialization_text();
    let [first, second] = planners;
    let mut contestants = [
        Contestant::join(first, &initialization)?,
        Contestant::join(second, &initialization)?,
    ];
    let mut unparsed = [0usize; 2];

    while !game.is_over() {
        let mut orders: [Vec<Command>; 2] = Default::default();
        for seat in Seat::BOTH {
            let line = contestants[seat.index()].respond(&game.turn_text(seat), config.timed);
            let (commands, errors) = parse_commands(&line);
            for error in &errors {
                tracing::warn!(?seat, %error, "Ignoring command");
            }
            unparsed[seat.index()] += errors.len();
            orders[seat.index()] = commands;
        }
        game.step([&orders[0], &orders[1]]);
    }

    let report = MatchReport {
        seed: config.seed,
        factories,
        turns: game.turn(),
        winner: game.winner(),
        cyborgs: Seat::BOTH.map(|s| game.cyborgs(s)),
        production: Seat::BOTH.map(|s| game.production(s)),
        factories_owned: Seat::BOTH.map(|s| game.factories_owned(s)),
        tallies: Seat::BOTH.map(|s| game.tally(s)),
        unparsed,
        failed_turns: [contestants[0].failed_turns, contestants[1].failed_turns],
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    tracing::info!("{}", report.summary());
    Ok(report)
}

/// Play `matches` seeds starting at `config.seed`, in parallel
pub fn run_series(config: &MatchConfig, matches: u64, planners: [PlannerConfig; 2]) -> Result<SeriesReport> {
    let reports = (0..matches)
        .into_par_iter()
        .map(|offset| {
            let config = MatchConfig {
                seed: config.seed.wrapping_add(offset),
                ..config.clone()
            };
            run_match(&config, planners.clone())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SeriesReport::new(reports))
}
