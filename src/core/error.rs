//! Error taxonomy for the simulation.
//!
//! Only `OutOfBounds` and `InvalidConfig` stop a game. The transport errors
//! (`MalformedMessage`, `TransportTimeout`, `ChannelClosed`) abort the turn or
//! negotiation they occur in and are otherwise logged and absorbed.

use super::PlayerId;

/// Errors raised by the grid, the transport and configuration loading.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GameError {
    /// A reply violated the protocol (wrong sender, impossible move, ...).
    #[error("malformed message from {player}: {reason}")]
    MalformedMessage {
        /// The player whose message was rejected.
        player: PlayerId,
        /// What was wrong with it.
        reason: String,
    },

    /// A coordinate outside the grid. Indicates a movement or setup bug.
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// A bounded wait expired. Treated as a rejection of whatever was awaited.
    #[error("timed out waiting for {waiting_for}")]
    TransportTimeout {
        /// Human-readable description of the awaited reply.
        waiting_for: String,
    },

    /// An agent's inbox or reply channel closed before the exchange finished.
    #[error("channel to {player} closed")]
    ChannelClosed {
        /// The unreachable player.
        player: PlayerId,
    },

    /// Configuration rejected before the game started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GameError {
    /// Whether this error ends the game rather than a single turn.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::OutOfBounds { .. } | GameError::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = GameError::OutOfBounds { x: -1, y: 4 };
        assert_eq!(err.to_string(), "cell (-1, 4) is outside the grid");

        let err = GameError::MalformedMessage {
            player: PlayerId::new(1),
            reason: "jumped two cells".into(),
        };
        assert_eq!(err.to_string(), "malformed message from Player2: jumped two cells");
    }

    #[test]
    fn test_fatality() {
        assert!(GameError::OutOfBounds { x: 0, y: 9 }.is_fatal());
        assert!(GameError::InvalidConfig("x".into()).is_fatal());
        assert!(!GameError::ChannelClosed { player: PlayerId::new(0) }.is_fatal());
        assert!(!GameError::TransportTimeout { waiting_for: "reply".into() }.is_fatal());
    }
}
