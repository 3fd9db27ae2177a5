//! The board: colors, palette, positions and the immutable grid.

pub mod color;
pub mod grid;

pub use color::{Color, Palette};
pub use grid::{Cell, Grid, Position};
