//! Greedy single-step movement.
//!
//! Each turn a player steps one cell along the axis with the larger remaining
//! distance to its goal; ties go to the X axis. No lookahead, no path memory.
//! Entering a cell costs one token of that cell's color.

use crate::agent::TokenBag;
use crate::board::{Color, Grid, Position};
use crate::core::GameError;

/// The cell a player will try to enter this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveCandidate {
    pub cell: Position,
    /// Token color needed to enter `cell`.
    pub required: Color,
}

/// The next cell on the way from `from` to `goal`, or `None` when already there.
///
/// ```
/// use colored_trails::board::Position;
/// use colored_trails::rules::movement::next_step;
///
/// // |dx| == |dy|: X wins the tie
/// assert_eq!(next_step(Position::new(0, 0), Position::new(2, 2)), Some(Position::new(1, 0)));
/// // Y is farther
/// assert_eq!(next_step(Position::new(0, 0), Position::new(1, 3)), Some(Position::new(0, 1)));
/// ```
#[must_use]
pub fn next_step(from: Position, goal: Position) -> Option<Position> {
    let dx = goal.x - from.x;
    let dy = goal.y - from.y;

    if dx == 0 && dy == 0 {
        None
    } else if dx.abs() >= dy.abs() {
        Some(Position::new(from.x + dx.signum(), from.y))
    } else {
        Some(Position::new(from.x, from.y + dy.signum()))
    }
}

/// The candidate cell and its required color.
///
/// Fails with `OutOfBounds` only if `from` or `goal` is off the grid.
pub fn candidate(grid: &Grid, from: Position, goal: Position) -> Result<Option<MoveCandidate>, GameError> {
    next_step(from, goal)
        .map(|cell| {
            grid.cell(cell).map(|c| MoveCandidate {
                cell,
                required: c.color,
            })
        })
        .transpose()
}

/// Whether `tokens` can pay for a cell of color `required`.
#[must_use]
pub fn can_move(tokens: &TokenBag, required: Color) -> bool {
    tokens.contains(required)
}
