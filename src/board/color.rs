//! Token colors and the game palette.

use serde::{Deserialize, Serialize};

use crate::core::GameRng;

/// A symbolic cell/token color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    /// Every color, in palette order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed set of colors a game draws cells and tokens from.
///
/// Order is preserved and duplicates are dropped. An empty palette is
/// representable so that deserialized configs can be rejected with a proper
/// error by `GameConfig::validate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build a palette from colors, dropping duplicates.
    pub fn new(colors: impl IntoIterator<Item = Color>) -> Self {
        let mut unique = Vec::with_capacity(Color::ALL.len());
        for color in colors {
            if !unique.contains(&color) {
                unique.push(color);
            }
        }
        Self { colors: unique }
    }

    /// All four colors.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Color::ALL)
    }

    /// A one-color palette.
    #[must_use]
    pub fn single(color: Color) -> Self {
        Self { colors: vec![color] }
    }

    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[must_use]
    pub fn contains(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Draw a uniformly random color, `None` for an empty palette.
    pub fn random(&self, rng: &mut GameRng) -> Option<Color> {
        rng.choose(&self.colors).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Vec<Color>> for Palette {
    fn from(colors: Vec<Color>) -> Self {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_palette() {
        let palette = Palette::standard();
        assert_eq!(palette.len(), 4);
        assert_eq!(palette.colors()[0], Color::Red);
        assert!(palette.contains(Color::Yellow));
    }

    #[test]
    fn test_duplicates_dropped() {
        let palette = Palette::new([Color::Blue, Color::Red, Color::Blue]);
        assert_eq!(palette.colors(), &[Color::Blue, Color::Red]);
    }

    #[test]
    fn test_random_stays_in_palette() {
        let palette = Palette::new([Color::Green, Color::Yellow]);
        let mut rng = GameRng::new(11);
        for _ in 0..100 {
            assert!(palette.contains(palette.random(&mut rng).unwrap()));
        }
    }

    #[test]
    fn test_empty_palette_draws_nothing() {
        assert_eq!(Palette::new([]).random(&mut GameRng::new(1)), None);
    }

    #[test]
    fn test_serde_as_list() {
        let palette = Palette::new([Color::Red, Color::Green]);
        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(json, r#"["Red","Green"]"#);

        let back: Palette = serde_json::from_str(r#"["Green","Green","Red"]"#).unwrap();
        assert_eq!(back.colors(), &[Color::Green, Color::Red]);
    }
}
