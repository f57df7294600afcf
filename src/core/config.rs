//! Planner configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. The bot binary always runs with
//! [`PlannerConfig::default`]; the arena can load alternatives from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::MAX_DISTANCE;
use crate::graph::RoutePolicy;

/// Garrison forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// How many turns ahead to simulate each owned factory
    ///
    /// No troop can be further away than the longest link, so looking past
    /// it only adds production noise.
    pub horizon: i32,

    /// Safety multiplier applied to production
    ///
    /// A captured factory should hold `garrison_modifier * production` extra
    /// cyborgs so it survives the first counter-attack.
    pub garrison_modifier: i32,

    /// Forecast garrison at or below this value counts as an emergency
    pub safety_threshold: i32,

    /// Turns of production kept home when releasing idle cyborgs
    ///
    /// At 1, a production-2 factory keeps 2 cyborgs back even when nothing
    /// is incoming.
    pub reserve_production_turns: i32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: MAX_DISTANCE,
            garrison_modifier: 2,
            safety_threshold: 0,
            reserve_production_turns: 1,
        }
    }
}

/// Objective value scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    /// Scale of the production tier value
    pub production_weight: f64,

    /// Stepped value per production level 0..=3
    ///
    /// Stepped rather than linear: the first point of production is worth
    /// the most relative to what it costs to take.
    pub production_tiers: [f64; 4],

    /// Weight of closeness to our own territory (inverse average distance)
    pub proximity_weight: f64,

    /// Weight of how weakly a target is held
    pub contest_weight: f64,

    /// Extra value per production point for neutral targets
    ///
    /// Neutral factories never reinforce, so they are cheaper than they look.
    pub neutral_bonus: f64,

    /// Multiplier when one of our bombs is already heading for the target
    pub bomb_bonus: f64,

    /// Multiplier for defending a factory we already own
    pub defense_weight: f64,
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            production_weight: 10.0,
            production_tiers: [0.0, 0.4, 0.7, 1.0],
            proximity_weight: 1.0,
            contest_weight: 1.0,
            neutral_bonus: 2.0,
            bomb_bonus: 1.5,
            defense_weight: 1.5,
        }
    }
}

/// Bounds on the assignment search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Small fixed quantity proposed next to "everything" and "exactly the need"
    pub probe_quantity: i32,

    /// Maximum number of combinations the enumerator may attempt per turn
    ///
    /// Empirically tuned: 10 000 - 15 000 stays well inside the turn
    /// deadline on the largest boards.
    pub combination_ceiling: u64,

    /// Largest number of assignments in one group
    pub max_group_size: usize,

    /// Wall-clock budget for one turn, in milliseconds
    pub turn_budget_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            probe_quantity: 2,
            combination_ceiling: 12_000,
            max_group_size: 4,
            turn_budget_ms: 40,
        }
    }
}

/// Shape of the fulfillment curve used when scoring groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Linear up to a cap, then penalised for every point past it
    #[default]
    Overshoot,
    /// Smooth saturation, never penalises overshoot
    Diminishing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    pub curve: CurveKind,

    /// Fulfillment past which neutral targets stop gaining value
    pub neutral_cap: f64,

    /// Fulfillment cap for enemy-held targets and defended factories
    ///
    /// Higher than `neutral_cap` because the opponent can reinforce.
    pub contested_cap: f64,

    /// Lowest value the overshoot penalty can reach
    pub floor: f64,

    /// Saturation scale of the diminishing curve
    pub diminishing_scale: f64,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            curve: CurveKind::Overshoot,
            neutral_cap: 1.4,
            contested_cap: 4.0,
            floor: 0.0,
            diminishing_scale: 1.5,
        }
    }
}

/// Command emission and secondary actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Send troops to the next hop of the route instead of the final target
    pub hop_by_hop: bool,

    pub route_policy: RoutePolicy,

    /// Push unassigned idle cyborgs toward the nearest enemy factory
    pub mop_up: bool,

    /// Cyborgs consumed by one INC
    pub inc_cost: i32,

    /// Idle cyborgs that must remain after paying for an INC
    pub inc_min_surplus: i32,

    /// Bombs available to each player for the whole game
    pub bombs: u32,

    /// Only enemy factories producing at least this much are bombed
    pub bomb_min_production: i32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            hop_by_hop: true,
            route_policy: RoutePolicy::SpreadTraffic,
            mop_up: true,
            inc_cost: 10,
            inc_min_surplus: 5,
            bombs: 2,
            bomb_min_production: 2,
        }
    }
}

/// Complete planner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub forecast: ForecastConfig,
    pub value: ValueConfig,
    pub search: SearchConfig,
    pub fulfillment: FulfillmentConfig,
    pub actions: ActionConfig,
}

impl PlannerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.forecast.horizon <= 0 {
            return Err(format!("horizon ({}) must be positive", self.forecast.horizon));
        }
        if self.search.max_group_size == 0 {
            return Err("max_group_size must be at least 1".into());
        }
        if self.search.probe_quantity <= 0 {
            return Err("probe_quantity must be positive".into());
        }
        if self.fulfillment.neutral_cap <= 0.0 || self.fulfillment.contested_cap <= 0.0 {
            return Err("fulfillment caps must be positive".into());
        }
        if self.value.production_tiers.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!(
                "production_tiers ({:?}) must be non-decreasing",
                self.value.production_tiers
            ));
        }
        Ok(())
    }
}

/// Load a planner config from a TOML file
///
/// Missing sections and fields fall back to their defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<PlannerConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<PlannerConfig> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PlannerError;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.forecast.garrison_modifier, 2);
        assert_eq!(config.search.probe_quantity, 2);
        assert_eq!(config.fulfillment.curve, CurveKind::Overshoot);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = parse_config(
            r#"
            [search]
            combination_ceiling = 5000

            [fulfillment]
            curve = "diminishing"

            [actions]
            route_policy = "direct"
            "#,
        )
        .unwrap();
        assert_eq!(config.search.combination_ceiling, 5000);
        assert_eq!(config.search.max_group_size, 4);
        assert_eq!(config.fulfillment.curve, CurveKind::Diminishing);
        assert_eq!(config.actions.route_policy, RoutePolicy::Direct);
        assert_eq!(config.forecast, ForecastConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[search]\ncombination_ceiling = \"lots\"");
        assert!(matches!(result, Err(PlannerError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_tiers() {
        let mut config = PlannerConfig::default();
        config.value.production_tiers = [0.0, 0.9, 0.5, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_configs_load() {
        let default = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/data/planner/default.toml")).unwrap();
        assert_eq!(default, PlannerConfig::default());

        let aggressive = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/data/planner/aggressive.toml")).unwrap();
        assert!(aggressive.validate().is_ok());
        assert_eq!(aggressive.fulfillment.curve, CurveKind::Diminishing);
        assert!(!aggressive.actions.hop_by_hop);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_config("data/planner/does_not_exist.toml");
        assert!(matches!(result, Err(PlannerError::IoError(_))));
    }
}
