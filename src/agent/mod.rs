//! Player agents: per-player state and the task that owns it.

pub mod actor;
pub mod state;

pub use actor::{AgentSettings, PlayerAgent};
pub use state::{PlayerState, TokenBag};
