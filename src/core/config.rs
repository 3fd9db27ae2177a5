//! Game configuration.
//!
//! Everything here is fixed at process start. A `GameConfig` can be built in
//! code with the `with_*` builders, read from `CT_*` environment variables
//! (`from_env`), or loaded from a JSON document (`from_json_str`,
//! `from_json_file`). Missing JSON fields fall back to the defaults.
//!
//! | field | default |
//! |---|---|
//! | `player_count` | 4 |
//! | `grid_width` x `grid_height` | 7 x 5 |
//! | `palette` | Red, Blue, Green, Yellow |
//! | `tokens_per_player` | 7 |
//! | `betrayal_probability` | 0.9 |
//! | `max_blocked_turns` | 3 |
//! | `max_total_turns` | 50 |
//! | `turn_delay_ms` | 0 |
//! | `turn_timeout_ms` | 5000 |
//! | `negotiation_timeout_ms` | 1000 |
//! | `seed` | none (entropy) |

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::player::MAX_PLAYERS;
use super::GameError;
use crate::board::Palette;

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of players (1-4).
    pub player_count: usize,

    /// Grid columns.
    pub grid_width: usize,

    /// Grid rows.
    pub grid_height: usize,

    /// Colors used for cells and tokens.
    pub palette: Palette,

    /// Tokens dealt to each player at start.
    pub tokens_per_player: usize,

    /// Probability that a proposer withholds its offered token after the
    /// partner accepted (0.0 to 1.0).
    pub betrayal_probability: f64,

    /// Consecutive blocked turns that count a player as stuck.
    pub max_blocked_turns: u32,

    /// Resolved turns after which the game ends. `None` = unlimited.
    pub max_total_turns: Option<u32>,

    /// Pause between turns, for watching a game unfold. Not part of the rules.
    pub turn_delay_ms: u64,

    /// How long the coordinator waits for a turn result.
    pub turn_timeout_ms: u64,

    /// How long a proposer waits for its partner's answer.
    pub negotiation_timeout_ms: u64,

    /// RNG seed. `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: MAX_PLAYERS,
            grid_width: 7,
            grid_height: 5,
            palette: Palette::standard(),
            tokens_per_player: 7,
            betrayal_probability: 0.9,
            max_blocked_turns: 3,
            max_total_turns: Some(50),
            turn_delay_ms: 0,
            turn_timeout_ms: 5_000,
            negotiation_timeout_ms: 1_000,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_players(mut self, count: usize) -> Self {
        self.player_count = count;
        self
    }

    #[must_use]
    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn with_tokens_per_player(mut self, count: usize) -> Self {
        self.tokens_per_player = count;
        self
    }

    #[must_use]
    pub fn with_betrayal_probability(mut self, probability: f64) -> Self {
        self.betrayal_probability = probability;
        self
    }

    #[must_use]
    pub fn with_max_blocked_turns(mut self, turns: u32) -> Self {
        self.max_blocked_turns = turns;
        self
    }

    #[must_use]
    pub fn with_max_total_turns(mut self, turns: Option<u32>) -> Self {
        self.max_total_turns = turns;
        self
    }

    #[must_use]
    pub fn with_turn_delay_ms(mut self, ms: u64) -> Self {
        self.turn_delay_ms = ms;
        self
    }

    /// Set both bounded waits.
    #[must_use]
    pub fn with_timeouts_ms(mut self, turn: u64, negotiation: u64) -> Self {
        self.turn_timeout_ms = turn;
        self.negotiation_timeout_ms = negotiation;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_millis(self.negotiation_timeout_ms)
    }

    /// Check every constraint the game relies on.
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |msg: String| Err(GameError::InvalidConfig(msg));

        if self.player_count == 0 || self.player_count > MAX_PLAYERS {
            return invalid(format!(
                "player_count must be 1-{MAX_PLAYERS}, got {}",
                self.player_count
            ));
        }
        if self.grid_width == 0 || self.grid_height == 0 {
            return invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }
        // Unique starts need one cell per player; a goal distinct from the
        // start needs a second cell.
        let cells = self.grid_width.saturating_mul(self.grid_height);
        if cells < self.player_count.max(2) {
            return invalid(format!(
                "{}x{} grid cannot seat {} players",
                self.grid_width, self.grid_height, self.player_count
            ));
        }
        if self.palette.is_empty() {
            return invalid("palette is empty".into());
        }
        if !(0.0..=1.0).contains(&self.betrayal_probability) {
            return invalid(format!(
                "betrayal_probability must be within 0.0-1.0, got {}",
                self.betrayal_probability
            ));
        }
        if self.max_blocked_turns == 0 {
            return invalid("max_blocked_turns must be at least 1".into());
        }
        if self.max_total_turns == Some(0) {
            return invalid("max_total_turns must be at least 1 (or unset)".into());
        }
        if self.negotiation_timeout_ms == 0 || self.negotiation_timeout_ms >= self.turn_timeout_ms {
            return invalid(format!(
                "negotiation_timeout_ms ({}) must be non-zero and below turn_timeout_ms ({})",
                self.negotiation_timeout_ms, self.turn_timeout_ms
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `CT_*` environment variables, then validated.
    pub fn from_env() -> Result<Self, GameError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GameError> {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "CT_PLAYERS")? {
            config.player_count = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_GRID_WIDTH")? {
            config.grid_width = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_GRID_HEIGHT")? {
            config.grid_height = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_TOKENS_PER_PLAYER")? {
            config.tokens_per_player = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_BETRAYAL_PROBABILITY")? {
            config.betrayal_probability = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_MAX_BLOCKED_TURNS")? {
            config.max_blocked_turns = v;
        }
        if let Some(v) = parse_var::<u32>(&lookup, "CT_MAX_TOTAL_TURNS")? {
            config.max_total_turns = (v > 0).then_some(v);
        }
        if let Some(v) = parse_var(&lookup, "CT_TURN_DELAY_MS")? {
            config.turn_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_TURN_TIMEOUT_MS")? {
            config.turn_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_NEGOTIATION_TIMEOUT_MS")? {
            config.negotiation_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "CT_SEED")? {
            config.seed = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| GameError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, GameError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| GameError::InvalidConfig(format!("{key}={raw}: {e}"))),
    }
}
