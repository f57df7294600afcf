//! Factory Siege - Entry Point
//!
//! Speaks the referee's line protocol: the board on stdin once, then one
//! entity block per turn, answered by one command line on stdout. Logs go to
//! stderr so they never reach the referee.

use std::io::{self, BufRead, Write};

use factory_siege::bot::Bot;
use factory_siege::core::error::{PlannerError, Result};
use factory_siege::core::PlannerConfig;
use factory_siege::graph::DistanceService;
use factory_siege::planner::budget::TurnBudget;
use factory_siege::planner::command::Command;
use factory_siege::world::protocol::{read_initialization, read_turn};
use factory_siege::world::WorldState;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("factory_siege=info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = PlannerConfig::default();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let graph = read_initialization(&mut input, config.actions.route_policy)?;
    tracing::info!(factories = graph.node_count(), "Board loaded");

    let mut world = WorldState::new(graph.node_count());
    let mut bot = Bot::new(config);

    loop {
        match play_one(&mut input, &mut world, &mut bot, &graph) {
            Ok(line) => writeln!(output, "{line}")?,
            Err(PlannerError::EndOfInput) => {
                tracing::info!(turns = bot.memory().turn, "Input closed");
                return Ok(());
            }
            Err(PlannerError::IoError(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed turn");
                writeln!(output, "{}", Command::Wait)?;
            }
        }
        output.flush()?;
    }
}

fn play_one<R: BufRead>(
    input: &mut R,
    world: &mut WorldState,
    bot: &mut Bot,
    graph: &DistanceService,
) -> Result<String> {
    let updates = read_turn(input)?;
    // Budget runs from the end of the turn's input
    let budget = TurnBudget::from_config(&bot.config().search);
    world.apply_turn(updates)?;
    let plan = bot.play_turn(graph, world, &budget);
    Ok(plan.render())
}
