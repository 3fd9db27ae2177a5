//! The colored board.
//!
//! A `Grid` is built once and never mutated; the coordinator shares it with
//! `Arc<Grid>`. Coordinates are signed so that a step off the edge is
//! representable and reported as `OutOfBounds` instead of wrapping.

use serde::{Deserialize, Serialize};

use super::{Color, Palette};
use crate::core::{GameError, GameRng};

/// A cell coordinate. `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[must_use]
    pub fn distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub position: Position,
    pub color: Color,
}

/// Rectangular board of colored cells, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid, asking `color_of` for each cell's color.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut color_of: impl FnMut(Position) -> Color,
    ) -> Result<Self, GameError> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidConfig(format!(
                "grid must be non-empty, got {width}x{height}"
            )));
        }
        if width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(GameError::InvalidConfig(format!("grid {width}x{height} is too large")));
        }

        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let position = Position::new(x, y);
                cells.push(Cell {
                    position,
                    color: color_of(position),
                });
            }
        }

        Ok(Self { width, height, cells })
    }

    /// A grid where every cell has the same color.
    pub fn uniform(width: usize, height: usize, color: Color) -> Result<Self, GameError> {
        Self::from_fn(width, height, |_| color)
    }

    /// A grid with each cell drawn uniformly from `palette`.
    pub fn random(
        width: usize,
        height: usize,
        palette: &Palette,
        rng: &mut GameRng,
    ) -> Result<Self, GameError> {
        let colors = palette.colors();
        if colors.is_empty() {
            return Err(GameError::InvalidConfig("palette is empty".into()));
        }
        Self::from_fn(width, height, |_| colors[rng.gen_range_usize(0..colors.len())])
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `position` lies on the board.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.width
            && (position.y as usize) < self.height
    }

    /// The cell at `position`.
    pub fn cell(&self, position: Position) -> Result<&Cell, GameError> {
        if !self.contains(position) {
            return Err(GameError::OutOfBounds {
                x: position.x,
                y: position.y,
            });
        }
        Ok(&self.cells[position.y as usize * self.width + position.x as usize])
    }

    /// The color at `(x, y)`.
    pub fn color_at(&self, x: i32, y: i32) -> Result<Color, GameError> {
        self.cell(Position::new(x, y)).map(|cell| cell.color)
    }

    /// All cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// All positions, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().map(|cell| cell.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_layout() {
        let grid = Grid::from_fn(3, 2, |p| if p.x == 2 { Color::Blue } else { Color::Red }).unwrap();

        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.color_at(2, 1), Ok(Color::Blue));
        assert_eq!(grid.color_at(0, 1), Ok(Color::Red));
        assert_eq!(grid.cells().count(), 6);
        assert_eq!(grid.cell(Position::new(1, 1)).unwrap().position, Position::new(1, 1));
    }

    #[test]
    fn test_out_of_bounds() {
        let grid = Grid::uniform(2, 2, Color::Green).unwrap();

        assert_eq!(grid.color_at(2, 0), Err(GameError::OutOfBounds { x: 2, y: 0 }));
        assert_eq!(grid.color_at(0, -1), Err(GameError::OutOfBounds { x: 0, y: -1 }));
        assert!(!grid.contains(Position::new(-1, 0)));
        assert!(grid.contains(Position::new(1, 1)));
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(matches!(
            Grid::uniform(0, 3, Color::Red),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_random_is_seed_deterministic() {
        let palette = Palette::standard();
        let a = Grid::random(7, 5, &palette, &mut GameRng::new(5)).unwrap();
        let b = Grid::random(7, 5, &palette, &mut GameRng::new(5)).unwrap();

        assert_eq!(a, b);
        assert!(a.cells().all(|c| palette.contains(c.color)));
    }

    #[test]
    fn test_distance() {
        assert_eq!(Position::new(0, 0).distance(Position::new(3, -2)), 5);
        assert_eq!(Position::new(1, 1).to_string(), "(1,1)");
    }
}
