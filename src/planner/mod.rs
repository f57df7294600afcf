//! Per-turn allocation pipeline
//!
//! forecast -> objective -> assignment -> combination -> selection -> command

pub mod assignment;
pub mod budget;
pub mod combination;
pub mod command;
pub mod forecast;
pub mod objective;
pub mod selection;

pub use assignment::{build_assignments, Assignment, CandidateSet};
pub use budget::TurnBudget;
pub use combination::{enumerate_groups, Enumeration};
pub use command::{emit_moves, parse_commands, render_commands, Command};
pub use forecast::{forecast_hostile, forecast_owned, AttackForecast, GarrisonForecast};
pub use objective::{generate_objectives, CapacitySource, NodeRole, Objective, ObjectiveKind, ObjectivePlan};
pub use selection::{select_best, FulfillmentCurve, ScoringCurve, Selection};
