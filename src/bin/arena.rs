//! Self-play arena
//!
//! Plays seeded matches between two planner configurations and prints a
//! summary or JSON.

use std::path::PathBuf;

use clap::Parser;
use factory_siege::arena::{run_series, MatchConfig};
use factory_siege::core::{load_config, PlannerConfig};
use tracing_subscriber::EnvFilter;

/// Arena - bot vs bot matches on generated boards
#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(about = "Run self-play matches between two planner configurations")]
struct Args {
    /// Seed of the first match; later matches count up from it
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of matches to play
    #[arg(long, default_value_t = 10)]
    matches: u64,

    /// Turns before a match is scored
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Planner config for the first seat (TOML, e.g. data/planner/default.toml)
    #[arg(long)]
    first: Option<PathBuf>,

    /// Planner config for the second seat
    #[arg(long)]
    second: Option<PathBuf>,

    /// Enforce the per-turn time budget
    #[arg(long, default_value_t = false)]
    timed: bool,

    /// Print the full report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the JSON report to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

fn planner(path: Option<&PathBuf>) -> Result<PlannerConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => PlannerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("factory_siege=warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let planners = [planner(args.first.as_ref())?, planner(args.second.as_ref())?];
    let config = MatchConfig {
        seed: args.seed,
        max_turns: args.max_turns,
        timed: args.timed,
        ..MatchConfig::default()
    };

    let series = run_series(&config, args.matches, planners)?;
    if args.json {
        println!("{}", series.to_json());
    } else {
        println!("{}", series.summary());
    }
    if let Some(path) = &args.out {
        series.save(path)?;
        tracing::info!(path = %path.display(), "Report written");
    }
    Ok(())
}
