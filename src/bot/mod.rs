//! Turn orchestration
//!
//! [`Bot`] owns the planner configuration and the little memory that survives
//! between turns. The distance service and the world snapshot are borrowed
//! for each call.

pub mod memory;
pub mod secondary;

pub use memory::BotMemory;

use serde::Serialize;

use crate::core::config::PlannerConfig;
use crate::core::types::{Cyborgs, Turn};
use crate::graph::DistanceService;
use crate::planner::assignment::build_assignments;
use crate::planner::budget::TurnBudget;
use crate::planner::combination::enumerate_groups;
use crate::planner::command::{emit_moves, render_commands, Command};
use crate::planner::objective::generate_objectives;
use crate::planner::selection::{select_best, ScoringCurve};
use crate::world::WorldState;

/// Counters describing how one turn was planned
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanStats {
    pub turn: Turn,
    pub objectives: usize,
    pub sources: usize,
    pub capacity: Cyborgs,
    pub proposed: usize,
    pub candidates: usize,
    pub attempted: u64,
    pub feasible: usize,
    pub completed_size: usize,
    pub best_score: Option<f64>,
    pub elapsed_us: u64,
}

/// Commands for one turn plus how they were reached
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnPlan {
    pub commands: Vec<Command>,
    pub stats: PlanStats,
}

impl TurnPlan {
    /// The output line for this turn
    pub fn render(&self) -> String {
        render_commands(&self.commands)
    }
}

pub struct Bot {
    config: PlannerConfig,
    memory: BotMemory,
}

impl Bot {
    pub fn new(config: PlannerConfig) -> Self {
        let memory = BotMemory::new(config.actions.bombs);
        Self { config, memory }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn memory(&self) -> &BotMemory {
        &self.memory
    }

    /// Plan one turn
    ///
    /// Never fails: with nothing to do the plan is empty and renders as
    /// `WAIT`.
    pub fn play_turn(&mut self, graph: &DistanceService, world: &WorldState, budget: &TurnBudget) -> TurnPlan {
        self.memory.observe(world);
        let mut plan = generate_objectives(world, graph, &self.config);

        let mut secondary = Vec::new();
        let mut bombing = Vec::new();
        if let Some((from, to)) = secondary::choose_bomb(world, graph, &self.memory, &self.config.actions) {
            if self.memory.record_bomb(to) {
                tracing::info!(turn = self.memory.turn, %from, %to, "Launching bomb");
                // Troops sent now would arrive into the blast
                plan.drop_objective(to);
                bombing.push(to);
                secondary.push(Command::Bomb { from, to });
            }
        }
        secondary.extend(secondary::choose_incs(&mut plan, world, graph, &self.config.actions));

        let candidates = build_assignments(&plan, world, graph, &self.config.search, budget);
        let enumeration = enumerate_groups(&candidates, budget);
        let curve = ScoringCurve::from_config(&self.config.fulfillment);
        let selection = select_best(&enumeration.groups, &candidates, &plan.objectives, &curve);

        let mut commands = emit_moves(
            selection.as_ref(),
            &candidates,
            &plan.sources,
            world,
            graph,
            &self.config.actions,
            &bombing,
        );
        commands.extend(secondary);

        let stats = PlanStats {
            turn: self.memory.turn,
            objectives: plan.objectives.len(),
            sources: plan.sources.len(),
            capacity: plan.total_capacity(),
            proposed: candidates.proposed,
            candidates: candidates.len(),
            attempted: enumeration.attempted,
            feasible: enumeration.groups.len(),
            completed_size: enumeration.completed_size,
            best_score: selection.as_ref().map(|s| s.score),
            elapsed_us: budget.elapsed().as_micros() as u64,
        };
        tracing::debug!(
            turn = stats.turn,
            objectives = stats.objectives,
            candidates = stats.candidates,
            attempted = stats.attempted,
            elapsed_us = stats.elapsed_us,
            "Planned turn"
        );

        TurnPlan { commands, stats }
    }
}
