//! HTTP client for the broadcast source: the per-round PGN stream and the
//! per-round JSON snapshot used as fallback.

use reqwest::Client;
use serde::Deserialize;

use broadcast_core::game_state::{ActiveSide, GameId, GameResult, GameState};

use crate::config::Config;
use crate::error::{Result, SyncError};

pub struct BroadcastClient {
    /// No total timeout: a live round keeps its stream open for hours.
    stream_client: Client,
    snapshot_client: Client,
    base: String,
}

impl BroadcastClient {
    pub fn new(config: &Config) -> Self {
        let stream_client = Client::builder()
            .user_agent("broadcast-sync/1.0")
            .build()
            .unwrap();
        let snapshot_client = Client::builder()
            .user_agent("broadcast-sync/1.0")
            .timeout(std::time::Duration::from_secs(config.snapshot_timeout_secs))
            .build()
            .unwrap();
        Self {
            stream_client,
            snapshot_client,
            base: config.broadcast_api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Open the long-lived PGN stream for a round. The caller reads the
    /// response incrementally via `bytes_stream()`.
    pub async fn stream_round_pgn(&self, round_id: &str) -> Result<reqwest::Response> {
        let url = format!("{}/api/stream/broadcast/round/{}.pgn", self.base, round_id);
        let resp = self.stream_client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SyncError::Status(resp.status()));
        }
        Ok(resp)
    }

    /// Fetch the JSON snapshot for a round (fallback path).
    pub async fn fetch_round_snapshot(&self, round_id: &str) -> Result<RoundSnapshot> {
        let url = format!("{}/api/broadcast/-/-/{}", self.base, round_id);
        let resp = self
            .snapshot_client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SyncError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct RoundSnapshot {
    #[serde(default)]
    pub games: Vec<SnapshotGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotGame {
    pub name: String,
    pub fen: Option<String>,
    pub status: Option<String>,
    pub last_move: Option<String>,
    #[serde(default)]
    pub players: Vec<SnapshotPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotPlayer {
    pub name: String,
    /// Remaining time in centiseconds.
    pub clock: Option<u64>,
    pub rating: Option<u32>,
}

impl SnapshotGame {
    /// Identity from the player entries, falling back to the display name.
    pub fn identity(&self) -> Option<GameId> {
        if self.players.len() >= 2 {
            return Some(GameId::new(
                self.players[0].name.clone(),
                self.players[1].name.clone(),
            ));
        }
        let (white, black) = self.name.split_once(" - ")?;
        Some(GameId::new(white, black))
    }

    /// Map a snapshot entry to the same derived-state shape the PGN
    /// extractor produces. Entries without a position yield `None` and are
    /// skipped by the caller.
    pub fn to_state(&self) -> Option<GameState> {
        let fen = self.fen.as_deref()?;
        let mut fields = fen.split_whitespace();
        let _placement = fields.next()?;

        let active_side = match fields.next() {
            Some("w") => ActiveSide::White,
            Some("b") => ActiveSide::Black,
            _ => ActiveSide::Unknown,
        };

        // Fields 3-5 are castling, en passant, halfmove; the sixth is the
        // fullmove number.
        let move_number = fields.nth(3).and_then(|m| m.parse().ok()).unwrap_or(1);

        let clock_secs = |i: usize| -> u32 {
            self.players
                .get(i)
                .and_then(|p| p.clock)
                .map(|centis| (centis / 100) as u32)
                .unwrap_or(0)
        };

        let result = match self.status.as_deref() {
            Some(status) => GameResult::parse(status),
            None => GameResult::Ongoing,
        };

        Some(GameState {
            last_fen: fen.to_string(),
            result,
            white_clock: clock_secs(0),
            black_clock: clock_secs(1),
            active_side,
            move_number,
        })
    }
}
