//! The engine facade: owns the shared state and the active round session,
//! and exposes the operations the overlay UI drives.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use broadcast_core::extract::extract_game_state;
use broadcast_core::game_state::GameId;

use crate::accumulator::GameAccumulator;
use crate::clients::broadcast::BroadcastClient;
use crate::clients::eval::EvalClient;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::ingest::{spawn_eval_fetches, IngestContext};
use crate::reconcile::reconcile;
use crate::session::{IngestMode, RoundSession};
use crate::share::{self, BackgroundMode, ShareState};
use crate::tracker::{GameTracker, TrackedGame};

struct EngineInner {
    config: Config,
    broadcast: Arc<BroadcastClient>,
    eval: Arc<EvalClient>,
    accumulator: GameAccumulator,
    tracker: GameTracker,
    session: Mutex<Option<RoundSession>>,
}

/// Cheap-clone handle to the synchronization engine. Methods that spawn
/// work must be called from within a tokio runtime.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    pub fn new(config: Config) -> Self {
        let broadcast = Arc::new(BroadcastClient::new(&config));
        let eval = Arc::new(EvalClient::new(&config));
        Self {
            inner: Arc::new(EngineInner {
                config,
                broadcast,
                eval,
                accumulator: GameAccumulator::new(),
                tracker: GameTracker::new(),
                session: Mutex::new(None),
            }),
        }
    }

    /// Begin ingesting a round, tearing down any previous session first.
    /// The accumulator is reset; tracked games keep their identities but
    /// lose derived state.
    pub async fn start_round(&self, round_id: &str) {
        // The lock is held across teardown, reset, and spawn so that
        // concurrent callers serialize: exactly one ingestion task is
        // alive at any time.
        let mut session = self.inner.session.lock().await;
        if let Some(old) = session.take() {
            old.shutdown().await;
        }
        self.inner.accumulator.reset();
        self.inner.tracker.discard_states();

        let ctx = IngestContext {
            broadcast: Arc::clone(&self.inner.broadcast),
            eval: Arc::clone(&self.inner.eval),
            accumulator: self.inner.accumulator.clone(),
            tracker: self.inner.tracker.clone(),
            config: self.inner.config.clone(),
            mode: Arc::new(std::sync::RwLock::new(IngestMode::Idle)),
        };
        *session = Some(RoundSession::spawn(ctx, round_id.to_string()));
    }

    /// Cancel the active ingestion task and wait for it to wind down.
    pub async fn stop(&self) {
        if let Some(session) = self.inner.session.lock().await.take() {
            session.shutdown().await;
        }
    }

    pub async fn current_round(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .map(|s| s.round_id().to_string())
    }

    pub async fn ingest_mode(&self) -> IngestMode {
        match self.inner.session.lock().await.as_ref() {
            Some(session) => session.mode(),
            None => IngestMode::Idle,
        }
    }

    /// Track a game for display. Duplicate identities are rejected. If the
    /// feed already holds a record for the game, its state is derived
    /// immediately and an initial evaluation requested.
    pub fn track_game(&self, id: GameId) -> Result<()> {
        self.inner.tracker.track(id.clone())?;

        if let Some(pgn) = self.inner.accumulator.get(&id) {
            if let Some(state) = extract_game_state(&pgn) {
                let mut states = HashMap::new();
                states.insert(id, state);
                let requests = reconcile(&self.inner.tracker, &states);
                spawn_eval_fetches(&self.inner.eval, &self.inner.tracker, requests);
            }
        }
        Ok(())
    }

    /// Stop displaying a game; returns whether it was tracked.
    pub fn untrack_game(&self, id: &GameId) -> bool {
        self.inner.tracker.untrack(id)
    }

    pub fn clear_tracked(&self) {
        self.inner.tracker.clear();
    }

    /// Snapshot of the displayed set, in display order.
    pub fn tracked_games(&self) -> Vec<TrackedGame> {
        self.inner.tracker.games()
    }

    /// Every identity the PGN feed has produced this round.
    pub fn available_games(&self) -> Vec<GameId> {
        self.inner.accumulator.identities()
    }

    /// Compact share token for the current viewing state.
    pub async fn share_token(&self, background: BackgroundMode) -> Result<String> {
        let session = self.inner.session.lock().await;
        let round = session.as_ref().ok_or(SyncError::NotStarted)?;
        Ok(share::encode(
            round.round_id(),
            &self.inner.tracker.ids(),
            background,
        ))
    }

    /// Reconstruct viewing state from a share token: replaces the tracked
    /// set and starts ingesting the encoded round.
    pub async fn load_share_token(&self, token: &str) -> Result<ShareState> {
        let state = share::decode(token).ok_or(SyncError::MalformedToken)?;
        self.clear_tracked();
        self.start_round(&state.round_id).await;

        // Compact tokens carry shortened names, which can only be matched
        // against the feed once it has produced a first batch.
        let engine = self.clone();
        let pairs = state.games.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            for pair in pairs {
                let id = engine
                    .resolve_identity(&pair.white, &pair.black)
                    .unwrap_or(pair);
                if let Err(e) = engine.track_game(id) {
                    tracing::debug!("Share-token game skipped: {e}");
                }
            }
        });

        Ok(state)
    }

    /// Match a (possibly shortened) player pair against the identities seen
    /// in the feed, case-insensitively.
    pub fn resolve_identity(&self, white: &str, black: &str) -> Option<GameId> {
        let white = white.to_lowercase();
        let black = black.to_lowercase();
        self.inner.accumulator.identities().into_iter().find(|id| {
            id.white.to_lowercase().contains(&white) && id.black.to_lowercase().contains(&black)
        })
    }
}
