//! Diffs freshly derived state against the tracked set.
//!
//! A position change applies all derived fields immediately and schedules an
//! evaluation lookup tagged with the position it was issued for; an unchanged
//! position is an idempotent no-op.

use std::collections::HashMap;

use broadcast_core::extract::extract_game_state;
use broadcast_core::game_state::{GameId, GameState};

use crate::accumulator::GameAccumulator;
use crate::tracker::GameTracker;

/// An evaluation lookup owed to a tracked game, tagged with the position it
/// was issued for so stale responses can be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalRequest {
    pub id: GameId,
    pub fen: String,
}

/// Derive fresh state for every tracked game from the accumulator's latest
/// records. Games without a record, or with an unextractable one, are simply
/// absent from the result.
pub fn derive_tracked_states(
    tracker: &GameTracker,
    accumulator: &GameAccumulator,
) -> HashMap<GameId, GameState> {
    tracker
        .ids()
        .into_iter()
        .filter_map(|id| {
            let pgn = accumulator.get(&id)?;
            let state = extract_game_state(&pgn)?;
            Some((id, state))
        })
        .collect()
}

/// Apply derived states to the tracked set. Returns the evaluation lookups
/// warranted by position changes; games that just reached a terminal result
/// get their fields applied but no lookup (the bar freezes).
pub fn reconcile(tracker: &GameTracker, states: &HashMap<GameId, GameState>) -> Vec<EvalRequest> {
    let mut requests = Vec::new();

    for (id, state) in states {
        if state.last_fen.is_empty() {
            continue;
        }
        let changed = tracker.with_game_mut(id, |game| {
            if game.state.last_fen == state.last_fen {
                return false;
            }
            game.state = state.clone();
            true
        });

        if changed == Some(true) && !state.result.is_terminal() {
            requests.push(EvalRequest {
                id: id.clone(),
                fen: state.last_fen.clone(),
            });
        }
    }

    requests
}

/// Write a resolved evaluation. Returns false (dropping the score) if the
/// game is gone or its position moved on since the request was issued.
pub fn apply_evaluation(tracker: &GameTracker, id: &GameId, fen: &str, score: f64) -> bool {
    tracker
        .with_game_mut(id, |game| {
            if game.state.last_fen != fen {
                return false;
            }
            game.evaluation = Some(score);
            true
        })
        .unwrap_or(false)
}
