//! Messages exchanged between the coordinator and player agents.
//!
//! Every message an agent can receive is a variant of [`AgentMessage`]; the
//! agent matches it exhaustively, so there is no "unknown conversation" case.
//! Requests that expect an answer carry their own `oneshot` reply channel.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::Mailbox;
use crate::agent::{PlayerState, TokenBag};
use crate::board::{Color, Position};
use crate::core::PlayerId;
use crate::negotiation::{NegotiationReply, TradeProposal};

/// Conversation a message belongs to, for logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conversation {
    Init,
    YourTurn,
    Negotiation,
    TurnResult,
    Lifecycle,
}

impl Conversation {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Conversation::Init => "init",
            Conversation::YourTurn => "your-turn",
            Conversation::Negotiation => "negotiation",
            Conversation::TurnResult => "turn-result",
            Conversation::Lifecycle => "lifecycle",
        }
    }
}

impl std::fmt::Display for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Starting conditions sent to each agent once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitPayload {
    pub start: Position,
    pub goal: Position,
    pub tokens: TokenBag,
    /// Every player in the game, including the recipient.
    pub roster: Vec<PlayerId>,
}

/// Turn status on the wire: `OK` or `BLOCKED`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStatus {
    Ok,
    /// `permanent` once the block streak reached the configured maximum.
    Blocked { permanent: bool },
}

impl TurnStatus {
    #[must_use]
    pub fn is_blocked(self) -> bool {
        matches!(self, TurnStatus::Blocked { .. })
    }
}

/// An agent's report after playing its turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub player: PlayerId,
    pub position: Position,
    pub tokens: TokenBag,
    pub status: TurnStatus,
    /// Whether the agent lacked the token and had to trade for it.
    pub negotiated: bool,
}

impl TurnResult {
    /// Replies to `YourTurn` travel back as their own conversation.
    #[must_use]
    pub fn conversation(&self) -> Conversation {
        Conversation::TurnResult
    }
}

/// Everything an agent's inbox can hold.
#[derive(Debug)]
pub enum AgentMessage {
    /// Starting state plus mailboxes for the rest of the roster.
    Init {
        payload: InitPayload,
        peers: Vec<Mailbox>,
    },
    /// Play a turn; entering the next cell needs `required`.
    YourTurn {
        required: Color,
        reply: oneshot::Sender<TurnResult>,
    },
    /// A peer asks for a token.
    Proposal {
        proposal: TradeProposal,
        reply: oneshot::Sender<NegotiationReply>,
    },
    /// A proposer keeps its word and delivers the offered token.
    Settlement { from: PlayerId, token: Color },
    /// Report current state.
    Snapshot { reply: oneshot::Sender<PlayerState> },
    /// Stop the agent task.
    Shutdown,
}

impl AgentMessage {
    #[must_use]
    pub fn conversation(&self) -> Conversation {
        match self {
            AgentMessage::Init { .. } => Conversation::Init,
            AgentMessage::YourTurn { .. } => Conversation::YourTurn,
            AgentMessage::Proposal { .. } | AgentMessage::Settlement { .. } => {
                Conversation::Negotiation
            }
            AgentMessage::Snapshot { .. } | AgentMessage::Shutdown => Conversation::Lifecycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_tags() {
        let (tx, _rx) = oneshot::channel();
        let msg = AgentMessage::YourTurn {
            required: Color::Red,
            reply: tx,
        };
        assert_eq!(msg.conversation(), Conversation::YourTurn);
        assert_eq!(msg.conversation().to_string(), "your-turn");

        let msg = AgentMessage::Settlement {
            from: PlayerId::new(0),
            token: Color::Blue,
        };
        assert_eq!(msg.conversation().tag(), "negotiation");
        assert_eq!(AgentMessage::Shutdown.conversation(), Conversation::Lifecycle);
        assert_eq!(Conversation::TurnResult.tag(), "turn-result");
    }

    #[test]
    fn test_turn_result_serde() {
        let result = TurnResult {
            player: PlayerId::new(1),
            position: Position::new(2, 3),
            tokens: [Color::Red, Color::Green].into_iter().collect(),
            status: TurnStatus::Blocked { permanent: true },
            negotiated: true,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: TurnResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.conversation().tag(), "turn-result");
        assert!(back.status.is_blocked());
        assert!(!TurnStatus::Ok.is_blocked());
    }
}
