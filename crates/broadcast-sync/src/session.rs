//! Lifecycle of the single active ingestion task.

use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::ingest::{ingest_loop, IngestContext};

/// How the active session is currently receiving data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Connecting, or between reconnect attempts.
    Idle,
    Streaming,
    Polling,
}

/// Handle to one round's ingestion task. Exactly one session is active at a
/// time; starting a new one tears the previous task down first.
pub struct RoundSession {
    round_id: String,
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    mode: Arc<RwLock<IngestMode>>,
}

impl RoundSession {
    pub(crate) fn spawn(ctx: IngestContext, round_id: String) -> Self {
        let cancel = CancellationToken::new();
        let mode = Arc::clone(&ctx.mode);
        let handle = tokio::spawn(ingest_loop(ctx, round_id.clone(), cancel.clone()));
        Self {
            round_id,
            handle,
            cancel,
            mode,
        }
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    pub fn mode(&self) -> IngestMode {
        *self.mode.read().unwrap()
    }

    /// Cancel the task and wait for it to finish. No read or timer fires
    /// after this returns.
    pub(crate) async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("Ingestion task for round {} ended badly: {e}", self.round_id);
        }
    }
}
