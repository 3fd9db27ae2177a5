//! Addressable handle to an agent's inbox.
//!
//! Every wait on a reply is bounded. An expired wait becomes
//! `TransportTimeout`; a dropped channel becomes `ChannelClosed`. Callers
//! treat both as a rejection of whatever they were waiting for.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use super::message::{AgentMessage, InitPayload, TurnResult};
use crate::agent::PlayerState;
use crate::board::Color;
use crate::core::{GameError, PlayerId};
use crate::negotiation::{NegotiationReply, TradeProposal};

/// Inbox capacity per agent. Only one turn is ever in flight, so this is
/// never close to full in a running game.
pub const INBOX_CAPACITY: usize = 32;

/// Sending half of one agent's inbox.
#[derive(Clone, Debug)]
pub struct Mailbox {
    player: PlayerId,
    tx: mpsc::Sender<AgentMessage>,
}

impl Mailbox {
    /// Create an inbox for `player`.
    pub fn channel(player: PlayerId) -> (Self, mpsc::Receiver<AgentMessage>) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        (Self { player, tx }, rx)
    }

    /// The player this mailbox delivers to.
    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    async fn send(&self, message: AgentMessage) -> Result<(), GameError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| GameError::ChannelClosed { player: self.player })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> AgentMessage,
        wait: Duration,
        what: &str,
    ) -> Result<T, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;

        match timeout(wait, reply_rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(GameError::ChannelClosed { player: self.player }),
            Err(_) => Err(GameError::TransportTimeout {
                waiting_for: format!("{what} from {}", self.player),
            }),
        }
    }

    /// Deliver starting conditions and the peers' mailboxes.
    pub async fn init(&self, payload: InitPayload, peers: Vec<Mailbox>) -> Result<(), GameError> {
        self.send(AgentMessage::Init { payload, peers }).await
    }

    /// Ask the agent to play its turn.
    pub async fn request_turn(&self, required: Color, wait: Duration) -> Result<TurnResult, GameError> {
        self.request(|reply| AgentMessage::YourTurn { required, reply }, wait, "turn result")
            .await
    }

    /// Send a trade proposal and wait for the answer.
    pub async fn propose(
        &self,
        proposal: TradeProposal,
        wait: Duration,
    ) -> Result<NegotiationReply, GameError> {
        self.request(
            |reply| AgentMessage::Proposal { proposal, reply },
            wait,
            "negotiation reply",
        )
        .await
    }

    /// Deliver a counter-grant. No acknowledgment; only queueing is bounded
    /// by `wait`.
    pub async fn settle(&self, from: PlayerId, token: Color, wait: Duration) -> Result<(), GameError> {
        match timeout(wait, self.send(AgentMessage::Settlement { from, token })).await {
            Ok(sent) => sent,
            Err(_) => Err(GameError::TransportTimeout {
                waiting_for: format!("inbox space at {}", self.player),
            }),
        }
    }

    /// Fetch the agent's current state.
    pub async fn snapshot(&self, wait: Duration) -> Result<PlayerState, GameError> {
        self.request(|reply| AgentMessage::Snapshot { reply }, wait, "snapshot")
            .await
    }

    /// Ask the agent to stop. An already-stopped agent is not an error.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(AgentMessage::Shutdown).await;
    }
}
