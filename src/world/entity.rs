//! Factories, troops and bombs as seen in one turn snapshot

use serde::{Deserialize, Serialize};

use crate::core::types::{Cyborgs, Distance, FactoryId, Owner, MAX_PRODUCTION};

/// A capturable production site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    pub id: FactoryId,
    pub owner: Owner,
    pub cyborgs: Cyborgs,
    pub production: i32,
    /// Turns left during which production is suspended (after a bomb)
    pub disabled_turns: i32,
}

impl Factory {
    pub fn new(id: FactoryId) -> Self {
        Self {
            id,
            owner: Owner::Neutral,
            cyborgs: 0,
            production: 0,
            disabled_turns: 0,
        }
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_cyborgs(mut self, cyborgs: Cyborgs) -> Self {
        self.cyborgs = cyborgs;
        self
    }

    pub fn with_production(mut self, production: i32) -> Self {
        self.production = production.clamp(0, MAX_PRODUCTION);
        self
    }

    pub fn with_disabled_turns(mut self, turns: i32) -> Self {
        self.disabled_turns = turns.max(0);
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_turns > 0
    }

    /// Whether production runs `turns_ahead` turns from now
    pub fn produces_at(&self, turns_ahead: i32) -> bool {
        turns_ahead > self.disabled_turns
    }
}

/// Cyborgs in flight between two factories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troop {
    pub id: i32,
    pub owner: Owner,
    pub origin: FactoryId,
    pub destination: FactoryId,
    pub cyborgs: Cyborgs,
    pub turns_remaining: Distance,
}

/// A bomb in flight
///
/// The opponent's bombs are reported without a target or arrival time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: i32,
    pub owner: Owner,
    pub origin: FactoryId,
    pub target: Option<FactoryId>,
    pub turns_remaining: Option<Distance>,
}

/// One parsed entity line of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityUpdate {
    Factory(Factory),
    Troop(Troop),
    Bomb(Bomb),
}
