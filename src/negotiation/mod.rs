//! Token trading between players.

pub mod protocol;

pub use protocol::{
    decide_honor, evaluate_proposal, select_offer, select_partner, Negotiation, NegotiationOutcome,
    NegotiationReply, NegotiationState, RejectReason, TradeProposal, DISTRUST_THRESHOLD,
};
