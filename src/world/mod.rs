pub mod entity;
pub mod protocol;
pub mod state;

pub use entity::{Bomb, EntityUpdate, Factory, Troop};
pub use state::WorldState;
