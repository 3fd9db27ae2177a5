//! # colored-trails
//!
//! A multi-agent Colored Trails game. Players walk a colored grid toward
//! private goals; entering a cell costs one token of that cell's color. A
//! player lacking the token may ask one peer for it, and may or may not pay
//! back what it offered.
//!
//! ## Design Principles
//!
//! 1. **Agents Own Their State**: Each player is a tokio task holding its own
//!    `PlayerState`. Other parties only exchange messages with it.
//!
//! 2. **One Turn In Flight**: A single coordinator schedules turns round-robin;
//!    a negotiation happens inside the acting player's turn.
//!
//! 3. **Every Wait Is Bounded**: A reply that does not arrive in time counts as
//!    a rejection (negotiation) or a blocked turn (coordinator).
//!
//! 4. **Reproducible**: All randomness flows from one seedable `GameRng`.
//!
//! ## Modules
//!
//! - `core`: Player ids, RNG, configuration, errors
//! - `board`: Colors, palette, grid
//! - `agent`: Player state and the agent task
//! - `rules`: Movement rule and termination policy
//! - `negotiation`: The one-token trade protocol
//! - `transport`: Agent messages and mailboxes
//! - `game`: Setup, turn coordinator, status sinks

pub mod core;
pub mod board;
pub mod agent;
pub mod rules;
pub mod negotiation;
pub mod transport;
pub mod game;

// Re-export commonly used types
pub use crate::core::{GameConfig, GameError, GameRng, PlayerId, PlayerMap, MAX_PLAYERS};

pub use crate::board::{Cell, Color, Grid, Palette, Position};

pub use crate::agent::{AgentSettings, PlayerAgent, PlayerState, TokenBag};

pub use crate::rules::{can_move, candidate, next_step, GameOver, MoveCandidate, TerminationPolicy};

pub use crate::negotiation::{
    Negotiation, NegotiationOutcome, NegotiationReply, NegotiationState, RejectReason, TradeProposal,
};

pub use crate::transport::{AgentMessage, Conversation, Mailbox, TurnResult, TurnStatus};

pub use crate::game::{
    run_game, ChannelSink, GameOutcome, GameSetup, RecordingSink, RenderSink, StatusEvent,
    TracingSink, TurnCoordinator, TurnOutcome, TurnPhase, TurnReport,
};
