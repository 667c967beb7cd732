use broadcast_core::game_state::GameId;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Bounded-timeout endpoints (snapshot, evaluation) report timeouts
    /// distinctly from other transport failures.
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Http(reqwest::Error),

    #[error("malformed share token")]
    MalformedToken,

    #[error("no round is active")]
    NotStarted,

    #[error("game already tracked: {0}")]
    AlreadyTracked(GameId),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
