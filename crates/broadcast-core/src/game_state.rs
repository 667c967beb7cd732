use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a game within a round: the (White, Black) player pair.
/// Comparison is case-sensitive and the pair is immutable once tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId {
    pub white: String,
    pub black: String,
}

impl GameId {
    pub fn new(white: impl Into<String>, black: impl Into<String>) -> Self {
        Self {
            white: white.into(),
            black: black.into(),
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.white, self.black)
    }
}

/// Terminal outcome of a game. `Ongoing` covers `*` and absent results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    /// Map a result token (`1-0`, `0-1`, `1/2-1/2`, broadcast-style `½-½`)
    /// to an outcome. Anything unrecognized counts as ongoing.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "1-0" => GameResult::WhiteWins,
            "0-1" => GameResult::BlackWins,
            "1/2-1/2" | "½-½" => GameResult::Draw,
            _ => GameResult::Ongoing,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameResult::Ongoing
    }
}

/// Which side the most recent clock says is to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveSide {
    White,
    Black,
    Unknown,
}

/// Derived state of a single game, computed either from its latest PGN
/// record or directly from a snapshot entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// FEN of the last reached position; empty until first extraction.
    pub last_fen: String,
    pub result: GameResult,
    /// Remaining time per side, in whole seconds.
    pub white_clock: u32,
    pub black_clock: u32,
    pub active_side: ActiveSide,
    pub move_number: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            last_fen: String::new(),
            result: GameResult::Ongoing,
            white_clock: 0,
            black_clock: 0,
            active_side: ActiveSide::Unknown,
            move_number: 1,
        }
    }
}
