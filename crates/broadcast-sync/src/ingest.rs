//! The ingestion task: streams the round's PGN feed, falling back to a
//! polled JSON snapshot when the stream is unavailable.
//!
//! One task runs per round session. Cancellation is cooperative and
//! immediate: a cancelled read never schedules a reconnect and a stopped
//! poller never ticks again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use broadcast_core::game_state::{GameId, GameState};
use broadcast_core::pgn::{split_with_identities, GAME_BOUNDARY};

use crate::accumulator::GameAccumulator;
use crate::clients::broadcast::{BroadcastClient, RoundSnapshot};
use crate::clients::eval::EvalClient;
use crate::config::Config;
use crate::reconcile::{apply_evaluation, derive_tracked_states, reconcile, EvalRequest};
use crate::session::IngestMode;
use crate::tracker::GameTracker;

/// Everything the ingestion task needs; cheap to clone into the spawned
/// task.
#[derive(Clone)]
pub(crate) struct IngestContext {
    pub broadcast: Arc<BroadcastClient>,
    pub eval: Arc<EvalClient>,
    pub accumulator: GameAccumulator,
    pub tracker: GameTracker,
    pub config: Config,
    pub mode: Arc<std::sync::RwLock<IngestMode>>,
}

impl IngestContext {
    fn set_mode(&self, mode: IngestMode) {
        *self.mode.write().unwrap() = mode;
    }
}

enum StreamOutcome {
    Ended,
    Failed,
    Cancelled,
}

pub(crate) async fn ingest_loop(ctx: IngestContext, round_id: String, cancel: CancellationToken) {
    loop {
        let connect = tokio::select! {
            res = ctx.broadcast.stream_round_pgn(&round_id) => res,
            _ = cancel.cancelled() => return,
        };

        let resp = match connect {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Stream unavailable for round {round_id} ({e}); polling snapshot instead");
                ctx.set_mode(IngestMode::Polling);
                polling_loop(&ctx, &round_id, &cancel).await;
                return;
            }
        };

        ctx.set_mode(IngestMode::Streaming);
        tracing::info!("Streaming round {round_id}");

        let delay = match stream_round(&ctx, resp, &cancel).await {
            StreamOutcome::Cancelled => return,
            // Clean end of stream: reconnect for the same round after a short
            // pause. The accumulator survives the reconnect.
            StreamOutcome::Ended => ctx.config.reconnect_delay_secs,
            StreamOutcome::Failed => ctx.config.error_retry_delay_secs,
        };

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
            _ = cancel.cancelled() => return,
        }
    }
}

/// Read the stream until it ends or errors, feeding every boundary-complete
/// batch through the splitter into the accumulator and reconciling after
/// each batch.
async fn stream_round(
    ctx: &IngestContext,
    resp: reqwest::Response,
    cancel: &CancellationToken,
) -> StreamOutcome {
    let mut stream = resp.bytes_stream();
    let mut buffer = String::new();
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let chunk = tokio::select! {
            chunk = stream.next() => chunk,
            _ = cancel.cancelled() => return StreamOutcome::Cancelled,
        };

        match chunk {
            Some(Ok(bytes)) => {
                buffer.push_str(&decode_utf8_chunk(&mut pending, &bytes));
                if let Some(complete) = drain_complete_games(&mut buffer) {
                    ingest_batch(ctx, &complete);
                }
            }
            // An errored read may have truncated a record mid-movetext;
            // ingesting it would regress that game until the reconnect
            // redelivers it, so the unterminated tail is dropped.
            Some(Err(e)) => {
                tracing::warn!("Stream read error: {e}; discarding unterminated tail");
                return StreamOutcome::Failed;
            }
            None => {
                flush_buffer(ctx, &mut buffer);
                tracing::info!("Stream ended; reconnecting");
                return StreamOutcome::Ended;
            }
        }
    }
}

/// Streaming UTF-8 decode. Chunk boundaries fall anywhere, so a multibyte
/// character can be split across reads; its leading bytes are held in
/// `pending` until the next chunk completes them. Genuinely invalid bytes
/// become U+FFFD.
fn decode_utf8_chunk(pending: &mut Vec<u8>, bytes: &[u8]) -> String {
    pending.extend_from_slice(bytes);
    let mut out = String::new();
    let mut rest = pending.as_slice();
    loop {
        match std::str::from_utf8(rest) {
            Ok(text) => {
                out.push_str(text);
                rest = &[];
                break;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(std::str::from_utf8(&rest[..valid]).unwrap());
                match e.error_len() {
                    Some(len) => {
                        out.push('\u{FFFD}');
                        rest = &rest[valid + len..];
                    }
                    None => {
                        rest = &rest[valid..];
                        break;
                    }
                }
            }
        }
    }
    let tail = rest.to_vec();
    *pending = tail;
    out
}

/// Split off every boundary-terminated record, leaving the unterminated
/// remainder buffered for the next chunk.
fn drain_complete_games(buffer: &mut String) -> Option<String> {
    let idx = buffer.rfind(GAME_BOUNDARY)?;
    let rest = buffer.split_off(idx + GAME_BOUNDARY.len());
    Some(std::mem::replace(buffer, rest))
}

/// End-of-stream leftovers are a final batch.
fn flush_buffer(ctx: &IngestContext, buffer: &mut String) {
    if !buffer.trim().is_empty() {
        let batch = std::mem::take(buffer);
        ingest_batch(ctx, &batch);
    }
}

fn ingest_batch(ctx: &IngestContext, batch: &str) {
    let mut count = 0;
    for (id, record) in split_with_identities(batch) {
        ctx.accumulator.upsert(id, record.to_string());
        count += 1;
    }
    if count > 0 {
        tracing::debug!("Ingested {count} records ({} games known)", ctx.accumulator.len());
    }
    let states = derive_tracked_states(&ctx.tracker, &ctx.accumulator);
    dispatch(ctx, &states);
}

/// Reconcile derived states and fire off the evaluation lookups they
/// warrant.
fn dispatch(ctx: &IngestContext, states: &HashMap<GameId, GameState>) {
    let requests = reconcile(&ctx.tracker, states);
    spawn_eval_fetches(&ctx.eval, &ctx.tracker, requests);
}

/// Fire-and-forget evaluation lookups. Failures leave the previous value;
/// responses for superseded positions are dropped.
pub(crate) fn spawn_eval_fetches(
    eval: &Arc<EvalClient>,
    tracker: &GameTracker,
    requests: Vec<EvalRequest>,
) {
    for request in requests {
        let eval = Arc::clone(eval);
        let tracker = tracker.clone();
        tokio::spawn(async move {
            match eval.evaluate(&request.fen).await {
                Ok(score) => {
                    if !apply_evaluation(&tracker, &request.id, &request.fen, score) {
                        tracing::debug!("Dropped stale evaluation for {}", request.id);
                    }
                }
                Err(e) => tracing::debug!("Evaluation lookup failed for {}: {e}", request.id),
            }
        });
    }
}

/// Fixed-interval snapshot polling. Snapshot entries already carry final
/// per-game state, so they bypass the accumulator and go straight to
/// reconciliation.
async fn polling_loop(ctx: &IngestContext, round_id: &str, cancel: &CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(ctx.config.poll_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => return,
        }
        tokio::select! {
            _ = poll_once(ctx, round_id) => {}
            _ = cancel.cancelled() => return,
        }
    }
}

async fn poll_once(ctx: &IngestContext, round_id: &str) {
    match ctx.broadcast.fetch_round_snapshot(round_id).await {
        Ok(snapshot) => {
            let states = snapshot_states(&snapshot);
            dispatch(ctx, &states);
        }
        Err(e) => tracing::warn!("Snapshot poll failed for round {round_id}: {e}"),
    }
}

fn snapshot_states(snapshot: &RoundSnapshot) -> HashMap<GameId, GameState> {
    snapshot
        .games
        .iter()
        .filter_map(|game| {
            let id = game.identity()?;
            let state = game.to_state()?;
            Some((id, state))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_unterminated_remainder() {
        let mut buffer = "[White \"A\"]\n[Black \"B\"]\n\n1. e4 *\n\n\n[White \"C\"".to_string();
        let complete = drain_complete_games(&mut buffer).unwrap();
        assert!(complete.ends_with("\n\n\n"));
        assert!(complete.contains("[White \"A\"]"));
        assert_eq!(buffer, "[White \"C\"");
    }

    #[test]
    fn test_drain_without_boundary_returns_none() {
        let mut buffer = "[White \"A\"]".to_string();
        assert!(drain_complete_games(&mut buffer).is_none());
        assert_eq!(buffer, "[White \"A\"]");
    }

    #[test]
    fn test_drain_takes_everything_up_to_last_boundary() {
        let mut buffer = "one\n\n\ntwo\n\n\ntail".to_string();
        let complete = drain_complete_games(&mut buffer).unwrap();
        assert_eq!(complete, "one\n\n\ntwo\n\n\n");
        assert_eq!(buffer, "tail");
    }

    #[test]
    fn test_decode_reassembles_character_split_across_chunks() {
        let text = "[White \"Žilka, S\"]";
        let bytes = text.as_bytes();
        // Cut between the two bytes of the two-byte character.
        let cut = text.find('Ž').unwrap() + 1;
        let mut pending = Vec::new();
        let mut out = decode_utf8_chunk(&mut pending, &bytes[..cut]);
        assert_eq!(pending.len(), 1);
        out.push_str(&decode_utf8_chunk(&mut pending, &bytes[cut..]));
        assert_eq!(out, text);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_decode_holds_incomplete_tail() {
        let mut pending = Vec::new();
        let out = decode_utf8_chunk(&mut pending, b"abc\xC5");
        assert_eq!(out, "abc");
        assert_eq!(pending, vec![0xC5]);
    }

    #[test]
    fn test_decode_replaces_invalid_bytes() {
        let mut pending = Vec::new();
        let out = decode_utf8_chunk(&mut pending, b"a\xFFb");
        assert_eq!(out, "a\u{FFFD}b");
        assert!(pending.is_empty());
    }
}
