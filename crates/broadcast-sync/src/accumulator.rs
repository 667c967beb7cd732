//! Latest raw PGN per game identity for the round being ingested.
//!
//! The single active ingestion task is the only writer; reconciliation reads
//! may interleave with writes and tolerate seeing either the old or the new
//! record for a key.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use broadcast_core::game_state::GameId;

#[derive(Clone, Default)]
pub struct GameAccumulator {
    inner: Arc<RwLock<HashMap<GameId, String>>>,
}

impl GameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored record for an identity unconditionally
    /// (last-write-wins, no merge).
    pub fn upsert(&self, id: GameId, pgn: String) {
        self.inner.write().unwrap().insert(id, pgn);
    }

    pub fn get(&self, id: &GameId) -> Option<String> {
        self.inner.read().unwrap().get(id).cloned()
    }

    /// All identities seen so far this round. Ordering is not a contract.
    pub fn identities(&self) -> Vec<GameId> {
        self.inner.read().unwrap().keys().cloned().collect()
    }

    /// Called exactly once per round start; never on a same-round reconnect.
    pub fn reset(&self) {
        self.inner.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
