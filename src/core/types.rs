//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a factory in the board.
///
/// Factory ids are dense (`0..node_count`) and double as indices into every
/// per-factory table, so cross references are ids, never pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactoryId(pub usize);

impl FactoryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who controls a factory, troop or bomb, from the bot's own perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Me,
    Neutral,
    Enemy,
}

impl Owner {
    /// Decode the protocol owner field (`1`, `0`, `-1`)
    pub fn from_protocol(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Me),
            0 => Some(Self::Neutral),
            -1 => Some(Self::Enemy),
            _ => None,
        }
    }

    pub fn to_protocol(self) -> i32 {
        match self {
            Self::Me => 1,
            Self::Neutral => 0,
            Self::Enemy => -1,
        }
    }

    /// The same owner seen from the other player's seat
    pub fn opposite(self) -> Self {
        match self {
            Self::Me => Self::Enemy,
            Self::Neutral => Self::Neutral,
            Self::Enemy => Self::Me,
        }
    }

    pub fn is_player(self) -> bool {
        self != Self::Neutral
    }
}

/// Game turn counter
pub type Turn = u32;

/// Cyborg count. Signed because forecasts go negative when a factory is overrun.
pub type Cyborgs = i32;

/// Travel time between factories, in turns
pub type Distance = i32;

/// Production rate can never exceed this
pub const MAX_PRODUCTION: i32 = 3;

/// Longest meaningful distance on a board; also the forecast horizon
pub const MAX_DISTANCE: Distance = 20;
