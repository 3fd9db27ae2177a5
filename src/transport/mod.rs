//! In-process agent transport: typed messages over tokio channels.
//!
//! Delivery is in order per inbox. Replies travel on per-request `oneshot`
//! channels and every wait for one is bounded (see [`Mailbox`]).

pub mod mailbox;
pub mod message;

pub use mailbox::{Mailbox, INBOX_CAPACITY};
pub use message::{AgentMessage, Conversation, InitPayload, TurnResult, TurnStatus};
