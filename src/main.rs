//! Run one Colored Trails game.
//!
//! Usage: `colored-trails [config.json]`
//!
//! Without a path, configuration comes from `CT_*` environment variables on
//! top of the defaults. Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colored_trails::{run_game, GameConfig, TracingSink};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "colored_trails=info".into()))
        .with(fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => GameConfig::from_env().context("reading CT_* environment")?,
    };

    let outcome = run_game(config, Box::new(TracingSink))
        .await
        .context("game failed")?;

    println!("{} after {} turns", outcome.reason, outcome.turns);
    for (id, player) in outcome.players.iter() {
        println!(
            "  {id}: at {} (goal {}), tokens {}, trail {}",
            player.position,
            player.goal,
            player.tokens,
            outcome.trails[id].len()
        );
    }
    Ok(())
}
