//! Factory Siege - turn-based troop allocation planner
//!
//! Each turn the planner forecasts every factory's garrison, turns the board
//! into defend and capture objectives, searches capacity-feasible groups of
//! assignments under a per-turn budget and emits the winning group as
//! commands.

pub mod arena;
pub mod bot;
pub mod core;
pub mod graph;
pub mod planner;
pub mod world;
