//! Client for the external position-evaluation service.
//!
//! Lookups are best-effort: every failure is swallowed at the call site and
//! the tracked game's evaluation keeps its previous value.

use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Result, SyncError};

pub struct EvalClient {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct EvalResponse {
    evaluation: f64,
}

impl EvalClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent("broadcast-sync/1.0")
            .timeout(std::time::Duration::from_secs(config.eval_timeout_secs))
            .build()
            .unwrap();
        Self {
            client,
            url: config.eval_api_url.clone(),
        }
    }

    /// Score a position in pawns, positive favoring White.
    pub async fn evaluate(&self, fen: &str) -> Result<f64> {
        let resp = self.client.get(&self.url).query(&[("fen", fen)]).send().await?;
        if !resp.status().is_success() {
            return Err(SyncError::Status(resp.status()));
        }
        let body: EvalResponse = resp.json().await?;
        Ok(body.evaluation)
    }
}
