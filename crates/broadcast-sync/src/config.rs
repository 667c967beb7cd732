use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the broadcast source (stream + snapshot endpoints).
    pub broadcast_api_base: String,
    /// Full URL of the evaluation endpoint.
    pub eval_api_url: String,
    pub poll_interval_secs: u64,
    /// Pause before reconnecting after a clean end-of-stream.
    pub reconnect_delay_secs: u64,
    /// Pause before reconnecting after a stream read error.
    pub error_retry_delay_secs: u64,
    pub snapshot_timeout_secs: u64,
    pub eval_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            broadcast_api_base: env::var("BROADCAST_API_BASE")
                .unwrap_or_else(|_| "https://lichess.org".to_string()),
            eval_api_url: env::var("EVAL_API_URL")
                .unwrap_or_else(|_| "https://eval.plc.hadron43.in/eval-bars/".to_string()),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            reconnect_delay_secs: env::var("RECONNECT_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            error_retry_delay_secs: env::var("ERROR_RETRY_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            snapshot_timeout_secs: env::var("SNAPSHOT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            eval_timeout_secs: env::var("EVAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
