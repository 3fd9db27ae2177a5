//! Per-player mutable state.
//!
//! ## TokenBag
//!
//! An ordered multiset of colors. Enumeration order is insertion order and
//! removal takes the first occurrence, so "first-encountered" tie-breaks are
//! well defined.
//!
//! ## PlayerState
//!
//! Position, goal, tokens, the consecutive-block counter and the per-peer
//! betrayal ledger. Owned by the player's agent; the coordinator keeps a
//! mirror updated from turn results.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{Color, Position};
use crate::core::PlayerId;

/// Ordered multiset of token colors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenBag(SmallVec<[Color; 8]>);

impl TokenBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, color: Color) -> bool {
        self.0.contains(&color)
    }

    /// How many tokens of `color` the bag holds.
    #[must_use]
    pub fn count(&self, color: Color) -> usize {
        self.0.iter().filter(|&&c| c == color).count()
    }

    pub fn push(&mut self, color: Color) {
        self.0.push(color);
    }

    /// Remove the first token of `color`. Returns false if there was none.
    pub fn remove_one(&mut self, color: Color) -> bool {
        match self.0.iter().position(|&c| c == color) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// The most frequent color; ties go to the color encountered first.
    #[must_use]
    pub fn mode(&self) -> Option<Color> {
        let mut counts: SmallVec<[(Color, usize); 4]> = SmallVec::new();
        for &color in &self.0 {
            match counts.iter_mut().find(|(c, _)| *c == color) {
                Some((_, n)) => *n += 1,
                None => counts.push((color, 1)),
            }
        }

        let mut best: Option<(Color, usize)> = None;
        for (color, n) in counts {
            if best.map_or(true, |(_, best_n)| n > best_n) {
                best = Some((color, n));
            }
        }
        best.map(|(color, _)| color)
    }

    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Color] {
        &self.0
    }
}

impl FromIterator<Color> for TokenBag {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for TokenBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, color) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{color}")?;
        }
        f.write_str("]")
    }
}

/// One player's game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub position: Position,
    pub goal: Position,
    pub tokens: TokenBag,

    /// Turns in a row without moving. Reset to 0 by any move.
    pub consecutive_blocks: u32,

    /// Betrayals recorded per peer. Counters only ever grow.
    betrayals: FxHashMap<PlayerId, u32>,
}

impl PlayerState {
    pub fn new(id: PlayerId, start: Position, goal: Position, tokens: TokenBag) -> Self {
        Self {
            id,
            position: start,
            goal,
            tokens,
            consecutive_blocks: 0,
            betrayals: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn at_goal(&self) -> bool {
        self.position == self.goal
    }

    /// Betrayals recorded against `peer` (0 if none).
    #[must_use]
    pub fn betrayals_with(&self, peer: PlayerId) -> u32 {
        self.betrayals.get(&peer).copied().unwrap_or(0)
    }

    /// Add one betrayal for `peer`; returns the new count.
    pub fn record_betrayal(&mut self, peer: PlayerId) -> u32 {
        let count = self.betrayals.entry(peer).or_insert(0);
        *count += 1;
        *count
    }

    /// Step onto `to`, spending one `required` token.
    ///
    /// Returns false (and changes nothing) if the token is missing.
    pub fn advance(&mut self, to: Position, required: Color) -> bool {
        if !self.tokens.remove_one(required) {
            return false;
        }
        self.position = to;
        self.consecutive_blocks = 0;
        true
    }

    /// Count a turn without movement; returns the new streak length.
    pub fn record_block(&mut self) -> u32 {
        self.consecutive_blocks += 1;
        self.consecutive_blocks
    }
}
