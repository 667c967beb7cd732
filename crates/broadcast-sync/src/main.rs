//! Demo runner: ingest a broadcast round and log tracked-game state until
//! interrupted.

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use broadcast_core::clock::format_clock;
use broadcast_core::game_state::GameId;
use broadcast_sync::config::Config;
use broadcast_sync::engine::SyncEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let round_id = match args.next() {
        Some(round_id) => round_id,
        None => {
            eprintln!("usage: broadcast-sync <round-id> [\"White - Black\" ...]");
            std::process::exit(2);
        }
    };

    let engine = SyncEngine::new(Config::from_env());
    engine.start_round(&round_id).await;

    for spec in args {
        match spec.split_once(" - ") {
            Some((white, black)) => {
                if let Err(e) = engine.track_game(GameId::new(white, black)) {
                    tracing::warn!("{e}");
                }
            }
            None => tracing::warn!("Ignoring {spec:?} (expected \"White - Black\")"),
        }
    }

    tokio::spawn({
        let engine = engine.clone();
        async move {
            loop {
                tokio::time::sleep(Duration::from_secs(5)).await;
                tracing::info!(
                    "{} games in feed ({:?})",
                    engine.available_games().len(),
                    engine.ingest_mode().await
                );
                for game in engine.tracked_games() {
                    tracing::info!(
                        "{}: eval={} move={} clocks {} / {} result={:?}",
                        game.id,
                        game.evaluation.map_or("?".to_string(), |e| format!("{e:+.1}")),
                        game.state.move_number,
                        format_clock(game.state.white_clock),
                        format_clock(game.state.black_clock),
                        game.state.result,
                    );
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    engine.stop().await;
    Ok(())
}
