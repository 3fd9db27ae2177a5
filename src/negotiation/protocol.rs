//! One-token trade between a blocked player and a peer.
//!
//! ## Flow
//!
//! ```text
//! Blocked --dispatch--> ProposalSent --on_reply--> Accepted --settle--> Resolved
//!                                              \-> Rejected --settle--> Resolved
//! ```
//!
//! The proposer picks the peer it has the fewest recorded betrayals with
//! (ties by id order) and offers its most frequent color. The partner
//! refuses anyone it has two or more betrayals recorded with, and otherwise
//! hands over the needed token if it has one. The grant is unconditional; the
//! proposer's counter-grant is not: with `betrayal_probability` it keeps its
//! offered token and records a betrayal with that partner. Taking a token
//! while offering nothing always counts as a betrayal.
//!
//! Nothing here touches channels. The agent drives the machine and does the
//! I/O, which keeps every rule testable without a runtime.

use serde::{Deserialize, Serialize};

use crate::agent::{PlayerState, TokenBag};
use crate::board::Color;
use crate::core::{GameRng, PlayerId};

/// Betrayal count at which a partner stops trading with a proposer.
pub const DISTRUST_THRESHOLD: u32 = 2;

/// A trade request. `offered == None` means the proposer has nothing to give.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub from: PlayerId,
    pub to: PlayerId,
    pub needed: Color,
    pub offered: Option<Color>,
}

/// Why a proposal did not yield a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The partner has too many betrayals recorded with the proposer.
    Distrusted,
    /// The partner does not hold the needed color.
    Unavailable,
    /// No answer arrived in time, or the partner was unreachable.
    NoResponse,
}

/// The partner's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationReply {
    /// The partner gave up this token.
    Accept(Color),
    Reject(RejectReason),
}

/// Proposer-side negotiation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegotiationState {
    Blocked,
    ProposalSent,
    Accepted(Color),
    Rejected(RejectReason),
    Resolved,
}

/// What a finished negotiation did to the proposer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NegotiationOutcome {
    pub proposal: TradeProposal,
    /// Token received from the partner.
    pub received: Option<Color>,
    /// Token the proposer sent back. `None` when betraying.
    pub counter_grant: Option<Color>,
    pub betrayed: bool,
    pub rejection: Option<RejectReason>,
}

impl NegotiationOutcome {
    /// Whether the proposer now holds the needed token.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.received.is_some()
    }
}

/// The peer with the fewest betrayals recorded by `proposer`; ties go to the
/// first in `peers` order.
#[must_use]
pub fn select_partner(proposer: &PlayerState, peers: &[PlayerId]) -> Option<PlayerId> {
    peers
        .iter()
        .copied()
        .filter(|&p| p != proposer.id)
        .min_by_key(|&p| proposer.betrayals_with(p))
}

/// The token to offer: the most frequent color held, first-encountered on ties.
#[must_use]
pub fn select_offer(tokens: &TokenBag) -> Option<Color> {
    tokens.mode()
}

/// Partner-side evaluation. On acceptance the needed token leaves `partner`.
pub fn evaluate_proposal(partner: &mut PlayerState, proposal: &TradeProposal) -> NegotiationReply {
    if partner.betrayals_with(proposal.from) >= DISTRUST_THRESHOLD {
        return NegotiationReply::Reject(RejectReason::Distrusted);
    }
    if partner.tokens.remove_one(proposal.needed) {
        NegotiationReply::Accept(proposal.needed)
    } else {
        NegotiationReply::Reject(RejectReason::Unavailable)
    }
}

/// Whether the proposer keeps its word this time.
pub fn decide_honor(rng: &mut GameRng, betrayal_probability: f64) -> bool {
    !rng.gen_bool(betrayal_probability)
}

/// A single trade attempt, driven by the proposer.
#[derive(Clone, Debug)]
pub struct Negotiation {
    proposal: TradeProposal,
    state: NegotiationState,
}

impl Negotiation {
    /// Pick a partner and an offer for a proposer lacking `needed`.
    ///
    /// Returns `None` when there is nobody to trade with.
    pub fn open(proposer: &PlayerState, peers: &[PlayerId], needed: Color) -> Option<Self> {
        let to = select_partner(proposer, peers)?;
        Some(Self {
            proposal: TradeProposal {
                from: proposer.id,
                to,
                needed,
                offered: select_offer(&proposer.tokens),
            },
            state: NegotiationState::Blocked,
        })
    }

    /// Mark the proposal as sent and return it for delivery.
    pub fn dispatch(&mut self) -> TradeProposal {
        if self.state == NegotiationState::Blocked {
            self.state = NegotiationState::ProposalSent;
        }
        self.proposal
    }

    #[must_use]
    pub fn proposal(&self) -> &TradeProposal {
        &self.proposal
    }

    #[must_use]
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Record the partner's answer; `None` means no answer arrived.
    pub fn on_reply(&mut self, reply: Option<NegotiationReply>) {
        if self.state != NegotiationState::ProposalSent {
            return;
        }
        self.state = match reply {
            Some(NegotiationReply::Accept(token)) => NegotiationState::Accepted(token),
            Some(NegotiationReply::Reject(reason)) => NegotiationState::Rejected(reason),
            None => NegotiationState::Rejected(RejectReason::NoResponse),
        };
    }

    /// Apply the result to the proposer.
    ///
    /// On acceptance the received token is added; then, unless the proposer
    /// betrays, the offered token is removed and returned as `counter_grant`
    /// for delivery to the partner. With nothing to offer there is nothing
    /// to honor, and the trade is recorded as a betrayal.
    pub fn settle(
        mut self,
        proposer: &mut PlayerState,
        rng: &mut GameRng,
        betrayal_probability: f64,
    ) -> NegotiationOutcome {
        let mut outcome = NegotiationOutcome {
            proposal: self.proposal,
            received: None,
            counter_grant: None,
            betrayed: false,
            rejection: None,
        };

        match self.state {
            NegotiationState::Accepted(token) => {
                proposer.tokens.push(token);
                outcome.received = Some(token);

                let honest = decide_honor(rng, betrayal_probability);
                match self.proposal.offered {
                    Some(offer) if honest && proposer.tokens.remove_one(offer) => {
                        outcome.counter_grant = Some(offer);
                    }
                    _ => {
                        proposer.record_betrayal(self.proposal.to);
                        outcome.betrayed = true;
                    }
                }
            }
            NegotiationState::Rejected(reason) => outcome.rejection = Some(reason),
            NegotiationState::Blocked | NegotiationState::ProposalSent => {
                outcome.rejection = Some(RejectReason::NoResponse)
            }
            NegotiationState::Resolved => {}
        }

        self.state = NegotiationState::Resolved;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use Color::*;

    fn player(id: u8, tokens: &[Color]) -> PlayerState {
        PlayerState::new(
            PlayerId::new(id),
            Position::new(0, id as i32),
            Position::new(3, id as i32),
            tokens.iter().copied().collect(),
        )
    }

    fn ids(raw: &[u8]) -> Vec<PlayerId> {
        raw.iter().map(|&i| PlayerId::new(i)).collect()
    }

    #[test]
    fn test_partner_defaults_to_first_peer() {
        let me = player(2, &[]);
        assert_eq!(select_partner(&me, &ids(&[0, 1, 3])), Some(PlayerId::new(0)));
    }

    #[test]
    fn test_partner_avoids_betrayals() {
        let mut me = player(0, &[]);
        me.record_betrayal(PlayerId::new(1));
        me.record_betrayal(PlayerId::new(1));
        me.record_betrayal(PlayerId::new(2));

        assert_eq!(select_partner(&me, &ids(&[1, 2, 3])), Some(PlayerId::new(3)));
        assert_eq!(select_partner(&me, &ids(&[1, 2])), Some(PlayerId::new(2)));
        assert_eq!(select_partner(&me, &ids(&[])), None);
    }

    #[test]
    fn test_partner_excludes_self() {
        let me = player(0, &[]);
        assert_eq!(select_partner(&me, &ids(&[0, 1])), Some(PlayerId::new(1)));
        assert_eq!(select_partner(&me, &ids(&[0])), None);
    }

    #[test]
    fn test_offer_is_mode_or_none() {
        assert_eq!(select_offer(&[Red, Blue, Blue].into_iter().collect()), Some(Blue));
        assert_eq!(select_offer(&TokenBag::new()), None);
    }

    #[test]
    fn test_partner_accepts_when_holding_token() {
        let mut partner = player(1, &[Green, Red, Green]);
        let proposal = TradeProposal {
            from: PlayerId::new(0),
            to: PlayerId::new(1),
            needed: Green,
            offered: Some(Blue),
        };

        assert_eq!(evaluate_proposal(&mut partner, &proposal), NegotiationReply::Accept(Green));
        assert_eq!(partner.tokens.as_slice(), &[Red, Green]);
    }

    #[test]
    fn test_partner_rejects_missing_token() {
        let mut partner = player(1, &[Red]);
        let proposal = TradeProposal {
            from: PlayerId::new(0),
            to: PlayerId::new(1),
            needed: Yellow,
            offered: None,
        };

        assert_eq!(
            evaluate_proposal(&mut partner, &proposal),
            NegotiationReply::Reject(RejectReason::Unavailable)
        );
        assert_eq!(partner.tokens.as_slice(), &[Red]);
    }

    #[test]
    fn test_partner_rejects_distrusted_proposer_without_looking() {
        let mut partner = player(1, &[Yellow]);
        partner.record_betrayal(PlayerId::new(0));
        partner.record_betrayal(PlayerId::new(0));
        let proposal = TradeProposal {
            from: PlayerId::new(0),
            to: PlayerId::new(1),
            needed: Yellow,
            offered: Some(Red),
        };

        assert_eq!(
            evaluate_proposal(&mut partner, &proposal),
            NegotiationReply::Reject(RejectReason::Distrusted)
        );
        assert_eq!(partner.tokens.as_slice(), &[Yellow]);
    }

    #[test]
    fn test_honored_trade() {
        let mut me = player(0, &[Red, Red, Blue]);
        let mut rng = GameRng::new(1);

        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Green).unwrap();
        assert_eq!(negotiation.state(), NegotiationState::Blocked);
        assert_eq!(negotiation.proposal().offered, Some(Red));

        let sent = negotiation.dispatch();
        assert_eq!(sent.to, PlayerId::new(1));
        assert_eq!(negotiation.state(), NegotiationState::ProposalSent);

        negotiation.on_reply(Some(NegotiationReply::Accept(Green)));
        assert_eq!(negotiation.state(), NegotiationState::Accepted(Green));

        let outcome = negotiation.settle(&mut me, &mut rng, 0.0);
        assert!(outcome.succeeded());
        assert!(!outcome.betrayed);
        assert_eq!(outcome.counter_grant, Some(Red));
        assert_eq!(me.tokens.as_slice(), &[Red, Blue, Green]);
        assert_eq!(me.betrayals_with(PlayerId::new(1)), 0);
    }

    #[test]
    fn test_betrayed_trade_keeps_both_tokens() {
        let mut me = player(0, &[Red]);
        let mut rng = GameRng::new(1);

        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Green).unwrap();
        negotiation.dispatch();
        negotiation.on_reply(Some(NegotiationReply::Accept(Green)));
        let outcome = negotiation.settle(&mut me, &mut rng, 1.0);

        assert!(outcome.succeeded());
        assert!(outcome.betrayed);
        assert_eq!(outcome.counter_grant, None);
        assert_eq!(me.tokens.as_slice(), &[Red, Green]);
        assert_eq!(me.betrayals_with(PlayerId::new(1)), 1);
    }

    #[test]
    fn test_empty_handed_trade_counts_as_betrayal() {
        let mut me = player(0, &[]);
        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Blue).unwrap();
        assert_eq!(negotiation.proposal().offered, None);

        negotiation.dispatch();
        negotiation.on_reply(Some(NegotiationReply::Accept(Blue)));
        // Even a certain honor draw has nothing to pay with.
        let outcome = negotiation.settle(&mut me, &mut GameRng::new(3), 0.0);

        assert!(outcome.succeeded());
        assert!(outcome.betrayed);
        assert_eq!(outcome.counter_grant, None);
        assert_eq!(me.tokens.as_slice(), &[Blue]);
        assert_eq!(me.betrayals_with(PlayerId::new(1)), 1);
    }

    #[test]
    fn test_reply_before_dispatch_ignored() {
        let mut me = player(0, &[Red]);
        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Blue).unwrap();
        negotiation.on_reply(Some(NegotiationReply::Accept(Blue)));
        assert_eq!(negotiation.state(), NegotiationState::Blocked);

        let outcome = negotiation.settle(&mut me, &mut GameRng::new(3), 0.0);
        assert_eq!(outcome.rejection, Some(RejectReason::NoResponse));
        assert_eq!(me.tokens.as_slice(), &[Red]);
    }

    #[test]
    fn test_rejection_and_timeout() {
        let mut me = player(0, &[Red]);

        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Blue).unwrap();
        negotiation.dispatch();
        negotiation.on_reply(Some(NegotiationReply::Reject(RejectReason::Unavailable)));
        let outcome = negotiation.settle(&mut me, &mut GameRng::new(3), 0.5);
        assert!(!outcome.succeeded());
        assert_eq!(outcome.rejection, Some(RejectReason::Unavailable));
        assert_eq!(me.tokens.as_slice(), &[Red]);

        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Blue).unwrap();
        negotiation.dispatch();
        negotiation.on_reply(None);
        assert_eq!(negotiation.state(), NegotiationState::Rejected(RejectReason::NoResponse));
        let outcome = negotiation.settle(&mut me, &mut GameRng::new(3), 0.5);
        assert_eq!(outcome.rejection, Some(RejectReason::NoResponse));
    }

    #[test]
    fn test_late_reply_ignored() {
        let me = player(0, &[Red]);
        let mut negotiation = Negotiation::open(&me, &ids(&[1]), Blue).unwrap();
        negotiation.dispatch();
        negotiation.on_reply(None);
        negotiation.on_reply(Some(NegotiationReply::Accept(Blue)));
        assert_eq!(negotiation.state(), NegotiationState::Rejected(RejectReason::NoResponse));
    }

    #[test]
    fn test_honor_rate_converges() {
        let mut rng = GameRng::new(2024);
        let trials = 20_000;
        let p = 0.3;

        let honored = (0..trials).filter(|_| decide_honor(&mut rng, p)).count();
        let rate = honored as f64 / trials as f64;

        assert!((rate - (1.0 - p)).abs() < 0.02, "honor rate {rate}");
    }
}
