//! Game rules: how a player moves and when the game ends.

pub mod movement;
pub mod termination;

pub use movement::{can_move, candidate, next_step, MoveCandidate};
pub use termination::{GameOver, TerminationPolicy};
