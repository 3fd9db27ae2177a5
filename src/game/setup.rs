//! Game bootstrap: board, starting cells, goals and hands.
//!
//! Every random draw comes from its own `GameRng::for_context` stream, so a
//! seeded config always produces the same board and the same players.

use crate::agent::{PlayerState, TokenBag};
use crate::board::{Grid, Position};
use crate::core::{GameConfig, GameError, GameRng, PlayerId, PlayerMap};

/// Initial board and player states for one game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSetup {
    pub grid: Grid,
    pub players: PlayerMap<PlayerState>,
}

impl GameSetup {
    /// Wrap a hand-built board and roster.
    ///
    /// Rejects positions off the board, shared starting cells and players
    /// that start on their goal.
    pub fn new(grid: Grid, players: PlayerMap<PlayerState>) -> Result<Self, GameError> {
        let mut starts = Vec::with_capacity(players.player_count());
        for (id, player) in players.iter() {
            if player.id != id {
                return Err(GameError::InvalidConfig(format!(
                    "{id} slot holds state for {}",
                    player.id
                )));
            }
            grid.cell(player.position)?;
            grid.cell(player.goal)?;
            if player.at_goal() {
                return Err(GameError::InvalidConfig(format!("{id} starts on its goal")));
            }
            if starts.contains(&player.position) {
                return Err(GameError::InvalidConfig(format!(
                    "{id} shares start cell {}",
                    player.position
                )));
            }
            starts.push(player.position);
        }
        Ok(Self { grid, players })
    }

    /// Generate a random game from `config`.
    ///
    /// Starts are unique cells; each goal is any cell other than its
    /// player's start. Hands hold `tokens_per_player` palette colors.
    pub fn generate(config: &GameConfig, rng: &GameRng) -> Result<Self, GameError> {
        config.validate()?;

        let grid = Grid::random(
            config.grid_width,
            config.grid_height,
            &config.palette,
            &mut rng.for_context("grid"),
        )?;

        let mut cells: Vec<Position> = grid.positions().collect();
        rng.for_context("starts").shuffle(&mut cells);

        let mut goal_rng = rng.for_context("goals");
        let mut hand_rng = rng.for_context("hands");

        let mut players = Vec::with_capacity(config.player_count);
        for (id, &start) in PlayerId::all(config.player_count).zip(cells.iter()) {
            let goals: Vec<Position> = cells.iter().copied().filter(|&p| p != start).collect();
            let goal = *goal_rng
                .choose(&goals)
                .ok_or_else(|| GameError::InvalidConfig("no cell available for a goal".into()))?;

            let tokens: TokenBag = (0..config.tokens_per_player)
                .filter_map(|_| config.palette.random(&mut hand_rng))
                .collect();

            players.push(PlayerState::new(id, start, goal, tokens));
        }

        if players.len() != config.player_count {
            return Err(GameError::InvalidConfig(format!(
                "{} cells cannot seat {} players",
                cells.len(),
                config.player_count
            )));
        }

        Self::new(grid, PlayerMap::from_vec(players))
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.player_count()
    }
}
