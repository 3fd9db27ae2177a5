//! Status events for whatever displays the game.
//!
//! The coordinator emits one [`StatusEvent`] per resolved turn. Sinks must
//! not fail the game: delivery is fire-and-forget.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::board::Position;
use crate::core::PlayerId;

/// A player's position after a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub player: PlayerId,
    pub position: Position,
    pub goal: Position,
    /// Distinct consecutive cells occupied so far, start included.
    pub trail: Vec<Position>,
}

/// Receives status events.
pub trait RenderSink: Send + Sync {
    fn update_position(&mut self, event: &StatusEvent);
}

/// Logs each event at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn update_position(&mut self, event: &StatusEvent) {
        info!(
            player = %event.player,
            position = %event.position,
            goal = %event.goal,
            trail_len = event.trail.len(),
            "status"
        );
    }
}

/// Forwards events to an unbounded channel. A dropped receiver is ignored.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RenderSink for ChannelSink {
    fn update_position(&mut self, event: &StatusEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Keeps every event in memory. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<StatusEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl RenderSink for RecordingSink {
    fn update_position(&mut self, event: &StatusEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
