//! End-of-game conditions.
//!
//! Checked after every resolved turn, in this order:
//!
//! 1. the acting player stands on its goal → `GoalReached`
//! 2. every player's block streak is at the threshold → `Stalemate`
//! 3. the resolved-turn count hit `max_total_turns` → `TurnLimit`

use serde::{Deserialize, Serialize};

use crate::agent::PlayerState;
use crate::core::{GameConfig, PlayerId, PlayerMap};

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOver {
    /// This player reached its goal.
    GoalReached(PlayerId),
    /// Every player is stuck.
    Stalemate,
    /// The turn cap was hit first.
    TurnLimit,
}

impl GameOver {
    /// The winner, if any.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            GameOver::GoalReached(p) => Some(*p),
            GameOver::Stalemate | GameOver::TurnLimit => None,
        }
    }
}

impl std::fmt::Display for GameOver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOver::GoalReached(p) => write!(f, "{p} reached the goal"),
            GameOver::Stalemate => f.write_str("stalemate: every player is blocked"),
            GameOver::TurnLimit => f.write_str("turn limit reached"),
        }
    }
}

/// Evaluates the end conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminationPolicy {
    pub max_blocked_turns: u32,
    pub max_total_turns: Option<u32>,
}

impl TerminationPolicy {
    pub fn new(max_blocked_turns: u32, max_total_turns: Option<u32>) -> Self {
        Self {
            max_blocked_turns,
            max_total_turns,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_blocked_turns, config.max_total_turns)
    }

    /// Whether every player has been blocked `max_blocked_turns` times in a row.
    #[must_use]
    pub fn all_blocked(&self, players: &PlayerMap<PlayerState>) -> bool {
        players
            .values()
            .all(|p| p.consecutive_blocks >= self.max_blocked_turns)
    }

    /// Decide whether the game ends after `acting` resolved turn number
    /// `turns_resolved` (1-based).
    #[must_use]
    pub fn evaluate(
        &self,
        players: &PlayerMap<PlayerState>,
        acting: PlayerId,
        turns_resolved: u32,
    ) -> Option<GameOver> {
        if players[acting].at_goal() {
            return Some(GameOver::GoalReached(acting));
        }
        if self.all_blocked(players) {
            return Some(GameOver::Stalemate);
        }
        match self.max_total_turns {
            Some(limit) if turns_resolved >= limit => Some(GameOver::TurnLimit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TokenBag;
    use crate::board::Position;

    fn players(blocks: &[u32]) -> PlayerMap<PlayerState> {
        PlayerMap::new(blocks.len(), |id| {
            let mut p = PlayerState::new(
                id,
                Position::new(id.index() as i32, 0),
                Position::new(id.index() as i32, 3),
                TokenBag::new(),
            );
            p.consecutive_blocks = blocks[id.index()];
            p
        })
    }

    #[test]
    fn test_goal_reached_wins_over_everything() {
        let mut ps = players(&[3, 3]);
        ps[PlayerId::new(1)].position = Position::new(1, 3);

        let policy = TerminationPolicy::new(3, Some(1));
        assert_eq!(
            policy.evaluate(&ps, PlayerId::new(1), 1),
            Some(GameOver::GoalReached(PlayerId::new(1)))
        );
        // Only the acting player's goal counts.
        assert_eq!(policy.evaluate(&ps, PlayerId::new(0), 1), Some(GameOver::Stalemate));
    }

    #[test]
    fn test_stalemate_needs_everyone() {
        let policy = TerminationPolicy::new(3, None);

        assert_eq!(policy.evaluate(&players(&[3, 2, 5]), PlayerId::new(0), 10), None);
        assert_eq!(
            policy.evaluate(&players(&[3, 4, 5]), PlayerId::new(0), 10),
            Some(GameOver::Stalemate)
        );
    }

    #[test]
    fn test_turn_limit() {
        let policy = TerminationPolicy::new(3, Some(50));
        let ps = players(&[0, 0]);

        assert_eq!(policy.evaluate(&ps, PlayerId::new(0), 49), None);
        assert_eq!(policy.evaluate(&ps, PlayerId::new(0), 50), Some(GameOver::TurnLimit));
        assert_eq!(TerminationPolicy::new(3, None).evaluate(&ps, PlayerId::new(0), 10_000), None);
    }

    #[test]
    fn test_winner_and_display() {
        assert_eq!(GameOver::GoalReached(PlayerId::new(2)).winner(), Some(PlayerId::new(2)));
        assert_eq!(GameOver::Stalemate.winner(), None);
        assert_eq!(
            GameOver::GoalReached(PlayerId::new(0)).to_string(),
            "Player1 reached the goal"
        );
    }
}
