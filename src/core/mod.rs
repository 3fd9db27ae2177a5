//! Core types: players, RNG, configuration, errors.
//!
//! These are shared by every other module and know nothing about turns or
//! negotiation.

pub mod player;
pub mod rng;
pub mod config;
pub mod error;

pub use player::{PlayerId, PlayerMap, MAX_PLAYERS};
pub use rng::GameRng;
pub use config::GameConfig;
pub use error::GameError;
