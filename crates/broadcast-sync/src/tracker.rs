//! The tracked-game set: the subset of the round the viewer displays.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use broadcast_core::game_state::{GameId, GameState};

use crate::error::{Result, SyncError};

/// One row of the displayed set.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedGame {
    pub id: GameId,
    pub state: GameState,
    /// Last known score in pawns, positive favoring White. `None` until the
    /// first successful lookup.
    pub evaluation: Option<f64>,
}

impl TrackedGame {
    fn new(id: GameId) -> Self {
        Self {
            id,
            state: GameState::default(),
            evaluation: None,
        }
    }
}

/// Shared handle to the tracked set, in display (insertion) order.
#[derive(Clone, Default)]
pub struct GameTracker {
    inner: Arc<RwLock<Vec<TrackedGame>>>,
}

impl GameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game to the displayed set. Duplicate identities are rejected.
    pub fn track(&self, id: GameId) -> Result<()> {
        let mut games = self.inner.write().unwrap();
        if games.iter().any(|g| g.id == id) {
            return Err(SyncError::AlreadyTracked(id));
        }
        games.push(TrackedGame::new(id));
        Ok(())
    }

    /// Remove a game; returns whether it was present.
    pub fn untrack(&self, id: &GameId) -> bool {
        let mut games = self.inner.write().unwrap();
        let before = games.len();
        games.retain(|g| g.id != *id);
        games.len() != before
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    /// Wipe derived state and evaluations but keep identities. Used on round
    /// change.
    pub fn discard_states(&self) {
        let mut games = self.inner.write().unwrap();
        for game in games.iter_mut() {
            game.state = GameState::default();
            game.evaluation = None;
        }
    }

    pub fn ids(&self) -> Vec<GameId> {
        self.inner.read().unwrap().iter().map(|g| g.id.clone()).collect()
    }

    /// Snapshot of the tracked set for display.
    pub fn games(&self) -> Vec<TrackedGame> {
        self.inner.read().unwrap().clone()
    }

    pub(crate) fn with_game_mut<T>(
        &self,
        id: &GameId,
        f: impl FnOnce(&mut TrackedGame) -> T,
    ) -> Option<T> {
        let mut games = self.inner.write().unwrap();
        games.iter_mut().find(|g| g.id == *id).map(f)
    }
}
