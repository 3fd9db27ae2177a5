//! Game assembly: setup, scheduling and status output.

pub mod coordinator;
pub mod render;
pub mod setup;

pub use coordinator::{
    validate_turn_result, GameOutcome, TurnCoordinator, TurnOutcome, TurnPhase, TurnReport,
};
pub use render::{ChannelSink, RecordingSink, RenderSink, StatusEvent, TracingSink};
pub use setup::GameSetup;

use tracing::info;

use crate::core::{GameConfig, GameError, GameRng};

/// Generate a game from `config` and play it to the end.
///
/// Must be called inside a tokio runtime.
pub async fn run_game(config: GameConfig, sink: Box<dyn RenderSink>) -> Result<GameOutcome, GameError> {
    config.validate()?;
    let mut rng = GameRng::from_seed_or_entropy(config.seed);
    info!(seed = rng.seed(), "starting game");

    let setup = GameSetup::generate(&config, &rng.for_context("setup"))?;
    let coordinator = TurnCoordinator::launch(config, setup, &mut rng, sink).await?;
    coordinator.run().await
}
