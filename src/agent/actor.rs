//! The player agent: one tokio task per player.
//!
//! An agent owns its `PlayerState` and is the only code that mutates it. It
//! reacts to its inbox:
//!
//! - `Init`: take the starting state and the peers' mailboxes
//! - `YourTurn`: move if it holds the required token, otherwise negotiate once
//!   and move if the trade produced the token
//! - `Proposal`: answer a peer's trade request
//! - `Settlement`: receive a counter-grant from an honest proposer
//! - `Snapshot` / `Shutdown`: lifecycle
//!
//! Because only one turn is in flight, a partner is always idle in its
//! receive loop when a proposal reaches it.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::PlayerState;
use crate::board::Color;
use crate::core::{GameConfig, GameRng, PlayerId};
use crate::negotiation::{evaluate_proposal, Negotiation, NegotiationOutcome, NegotiationReply, TradeProposal};
use crate::rules::{can_move, next_step};
use crate::transport::{AgentMessage, InitPayload, Mailbox, TurnResult, TurnStatus};

/// Per-agent tunables taken from `GameConfig`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSettings {
    pub betrayal_probability: f64,
    pub max_blocked_turns: u32,
    pub negotiation_timeout: Duration,
}

impl AgentSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            betrayal_probability: config.betrayal_probability,
            max_blocked_turns: config.max_blocked_turns,
            negotiation_timeout: config.negotiation_timeout(),
        }
    }
}

/// A player's agent task.
pub struct PlayerAgent {
    id: PlayerId,
    settings: AgentSettings,
    rng: GameRng,
    inbox: mpsc::Receiver<AgentMessage>,
    /// `None` until `Init` arrives.
    state: Option<PlayerState>,
    /// Other players' mailboxes, in id order.
    peers: Vec<Mailbox>,
}

impl PlayerAgent {
    /// Create an agent and the mailbox that reaches it.
    pub fn new(id: PlayerId, settings: AgentSettings, rng: GameRng) -> (Self, Mailbox) {
        let (mailbox, inbox) = Mailbox::channel(id);
        let agent = Self {
            id,
            settings,
            rng,
            inbox,
            state: None,
            peers: Vec::new(),
        };
        (agent, mailbox)
    }

    /// Run the agent on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process messages until `Shutdown` or until every mailbox is dropped.
    pub async fn run(mut self) {
        while let Some(message) = self.inbox.recv().await {
            debug!(player = %self.id, conversation = %message.conversation(), "message received");

            match message {
                AgentMessage::Init { payload, peers } => self.handle_init(payload, peers),
                AgentMessage::YourTurn { required, reply } => self.handle_turn(required, reply).await,
                AgentMessage::Proposal { proposal, reply } => self.handle_proposal(proposal, reply),
                AgentMessage::Settlement { from, token } => self.handle_settlement(from, token),
                AgentMessage::Snapshot { reply } => match &self.state {
                    Some(state) => {
                        let _ = reply.send(state.clone());
                    }
                    None => warn!(player = %self.id, "snapshot requested before init"),
                },
                AgentMessage::Shutdown => break,
            }
        }
        debug!(player = %self.id, "agent stopped");
    }

    fn handle_init(&mut self, payload: InitPayload, peers: Vec<Mailbox>) {
        if self.state.is_some() {
            warn!(player = %self.id, "duplicate init ignored");
            return;
        }

        let mut peers: Vec<Mailbox> = peers
            .into_iter()
            .filter(|m| m.player() != self.id && payload.roster.contains(&m.player()))
            .collect();
        peers.sort_by_key(Mailbox::player);
        self.peers = peers;

        info!(
            player = %self.id,
            start = %payload.start,
            goal = %payload.goal,
            tokens = %payload.tokens,
            "initialized"
        );
        self.state = Some(PlayerState::new(self.id, payload.start, payload.goal, payload.tokens));
    }

    async fn handle_turn(&mut self, required: Color, reply: oneshot::Sender<TurnResult>) {
        let Some(result) = self.play_turn(required).await else {
            warn!(player = %self.id, "turn requested before init");
            return;
        };
        debug!(
            player = %self.id,
            conversation = %result.conversation(),
            status = ?result.status,
            "reporting turn"
        );
        if reply.send(result).is_err() {
            warn!(player = %self.id, "coordinator stopped waiting for turn result");
        }
    }

    /// Play one turn. `None` if the agent has not been initialized.
    async fn play_turn(&mut self, required: Color) -> Option<TurnResult> {
        let state = self.state.as_ref()?;
        let target = next_step(state.position, state.goal);
        let holds = can_move(&state.tokens, required);
        let negotiated = target.is_some() && !holds;

        let moved = match target {
            // Already home; nothing to pay for.
            None => true,
            Some(to) => {
                if negotiated {
                    let outcome = self.negotiate(required).await;
                    if let Some(outcome) = &outcome {
                        self.log_negotiation(outcome);
                    }
                }
                let state = self.state.as_mut()?;
                let moved = state.advance(to, required);
                if moved {
                    info!(player = %self.id, to = %to, paid = %required, "moved");
                }
                moved
            }
        };

        let state = self.state.as_mut()?;
        let status = if moved {
            TurnStatus::Ok
        } else {
            let streak = state.record_block();
            let permanent = streak >= self.settings.max_blocked_turns;
            info!(player = %self.id, streak, permanent, needed = %required, "blocked");
            TurnStatus::Blocked { permanent }
        };

        Some(TurnResult {
            player: self.id,
            position: state.position,
            tokens: state.tokens.clone(),
            status,
            negotiated,
        })
    }

    /// Run one trade attempt for `needed`. `None` if there is nobody to ask.
    async fn negotiate(&mut self, needed: Color) -> Option<NegotiationOutcome> {
        let peer_ids: Vec<PlayerId> = self.peers.iter().map(Mailbox::player).collect();
        let mut negotiation = Negotiation::open(self.state.as_ref()?, &peer_ids, needed)?;
        let proposal = negotiation.dispatch();
        let partner = self.peers.iter().find(|m| m.player() == proposal.to)?;

        debug!(
            player = %self.id,
            partner = %proposal.to,
            needed = %proposal.needed,
            offered = ?proposal.offered,
            "proposing trade"
        );

        let reply = match partner.propose(proposal, self.settings.negotiation_timeout).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(player = %self.id, partner = %proposal.to, error = %e, "no negotiation reply");
                None
            }
        };
        negotiation.on_reply(reply);

        let state = self.state.as_mut()?;
        let outcome = negotiation.settle(state, &mut self.rng, self.settings.betrayal_probability);

        if let Some(token) = outcome.counter_grant {
            if let Err(e) = partner
                .settle(self.id, token, self.settings.negotiation_timeout)
                .await
            {
                // Undelivered tokens stay with the proposer.
                warn!(player = %self.id, partner = %proposal.to, error = %e, "counter-grant undeliverable");
                self.state.as_mut()?.tokens.push(token);
            }
        }
        Some(outcome)
    }

    fn log_negotiation(&self, outcome: &NegotiationOutcome) {
        let partner = outcome.proposal.to;
        match (outcome.received, outcome.rejection) {
            (Some(token), _) if outcome.betrayed => {
                info!(player = %self.id, %partner, received = %token, "trade accepted, offer withheld")
            }
            (Some(token), _) => {
                info!(player = %self.id, %partner, received = %token, sent = ?outcome.counter_grant, "trade completed")
            }
            (None, reason) => info!(player = %self.id, %partner, reason = ?reason, "trade rejected"),
        }
    }

    fn handle_proposal(&mut self, proposal: TradeProposal, reply: oneshot::Sender<NegotiationReply>) {
        let Some(state) = self.state.as_mut() else {
            warn!(player = %self.id, from = %proposal.from, "proposal before init ignored");
            return;
        };

        let answer = evaluate_proposal(state, &proposal);
        debug!(player = %self.id, from = %proposal.from, answer = ?answer, "answered proposal");

        // If the proposer already gave up waiting, keep the token.
        if let Err(NegotiationReply::Accept(token)) = reply.send(answer) {
            warn!(player = %self.id, from = %proposal.from, "proposer gone, token kept");
            state.tokens.push(token);
        }
    }

    fn handle_settlement(&mut self, from: PlayerId, token: Color) {
        match self.state.as_mut() {
            Some(state) => {
                state.tokens.push(token);
                debug!(player = %self.id, %from, %token, "received counter-grant");
            }
            None => warn!(player = %self.id, %from, "settlement before init dropped"),
        }
    }
}
