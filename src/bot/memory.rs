//! State the bot carries from one turn to the next

use ahash::AHashSet;
use serde::Serialize;

use crate::core::types::{FactoryId, Owner, Turn};
use crate::world::WorldState;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BotMemory {
    /// Turns played so far, counting the current one
    pub turn: Turn,
    /// Our largest factory on the first turn
    pub home: Option<FactoryId>,
    /// Bombs we may still launch
    pub bombs_left: u32,
    bombed: AHashSet<FactoryId>,
}

impl BotMemory {
    pub fn new(bombs: u32) -> Self {
        Self {
            bombs_left: bombs,
            ..Self::default()
        }
    }

    /// Start a new turn
    pub fn observe(&mut self, world: &WorldState) {
        self.turn += 1;
        if self.home.is_none() {
            // First maximum wins so the choice is stable across runs
            self.home = world
                .owned_nodes(Owner::Me)
                .fold(None, |best: Option<(FactoryId, i32)>, f| match best {
                    Some((_, cyborgs)) if cyborgs >= f.cyborgs => best,
                    _ => Some((f.id, f.cyborgs)),
                })
                .map(|(id, _)| id);
        }
    }

    pub fn is_bombed(&self, target: FactoryId) -> bool {
        self.bombed.contains(&target)
    }

    /// Record a launch; returns false if no bomb was left
    pub fn record_bomb(&mut self, target: FactoryId) -> bool {
        if self.bombs_left == 0 {
            return false;
        }
        self.bombs_left -= 1;
        self.bombed.insert(target);
        true
    }
}
