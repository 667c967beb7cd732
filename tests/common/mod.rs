//! In-process fixture server standing in for the broadcast source and the
//! evaluation service, so the engine tests run hermetically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::{self, StreamExt};

use broadcast_sync::config::Config;

/// One scripted stream connect: either a whole body, or explicit byte
/// chunks paced apart so the client sees separate reads, optionally ending
/// in a mid-body transport error.
enum StreamScript {
    Whole(String),
    Chunks { chunks: Vec<Vec<u8>>, fail: bool },
}

/// Scripted responses plus hit counters for assertions.
pub struct Fixture {
    /// Successive stream bodies; each connect consumes the front one. When
    /// none remain the stream endpoint 404s, which pushes the ingestor into
    /// polling fallback.
    stream_bodies: Mutex<Vec<StreamScript>>,
    snapshot: Mutex<serde_json::Value>,
    eval_score: Mutex<f64>,
    eval_hits: AtomicUsize,
    snapshot_hits: AtomicUsize,
}

impl Fixture {
    fn new() -> Self {
        Self {
            stream_bodies: Mutex::new(Vec::new()),
            snapshot: Mutex::new(serde_json::json!({ "games": [] })),
            eval_score: Mutex::new(0.35),
            eval_hits: AtomicUsize::new(0),
            snapshot_hits: AtomicUsize::new(0),
        }
    }

    pub fn push_stream_body(&self, body: impl Into<String>) {
        self.stream_bodies
            .lock()
            .unwrap()
            .push(StreamScript::Whole(body.into()));
    }

    pub fn push_stream_chunks(&self, chunks: Vec<Vec<u8>>) {
        self.stream_bodies
            .lock()
            .unwrap()
            .push(StreamScript::Chunks { chunks, fail: false });
    }

    /// Deliver the chunks, then abort the body mid-stream so the client's
    /// next read errors.
    pub fn push_stream_failure(&self, chunks: Vec<Vec<u8>>) {
        self.stream_bodies
            .lock()
            .unwrap()
            .push(StreamScript::Chunks { chunks, fail: true });
    }

    pub fn set_snapshot(&self, snapshot: serde_json::Value) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn set_eval_score(&self, score: f64) {
        *self.eval_score.lock().unwrap() = score;
    }

    pub fn eval_hits(&self) -> usize {
        self.eval_hits.load(Ordering::SeqCst)
    }

    pub fn snapshot_hits(&self) -> usize {
        self.snapshot_hits.load(Ordering::SeqCst)
    }
}

async fn stream_handler(
    State(fixture): State<Arc<Fixture>>,
    Path(_file): Path<String>,
) -> Response {
    let script = {
        let mut bodies = fixture.stream_bodies.lock().unwrap();
        if bodies.is_empty() {
            return StatusCode::NOT_FOUND.into_response();
        }
        bodies.remove(0)
    };
    match script {
        StreamScript::Whole(body) => body.into_response(),
        StreamScript::Chunks { chunks, fail } => {
            let mut parts: Vec<Result<Bytes, String>> =
                chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
            if fail {
                parts.push(Err("stream interrupted".to_string()));
            }
            let body = Body::from_stream(stream::iter(parts).then(|part| async move {
                tokio::time::sleep(Duration::from_millis(25)).await;
                part
            }));
            body.into_response()
        }
    }
}

async fn snapshot_handler(
    State(fixture): State<Arc<Fixture>>,
    Path(_round): Path<String>,
) -> Json<serde_json::Value> {
    fixture.snapshot_hits.fetch_add(1, Ordering::SeqCst);
    Json(fixture.snapshot.lock().unwrap().clone())
}

async fn eval_handler(State(fixture): State<Arc<Fixture>>) -> Json<serde_json::Value> {
    fixture.eval_hits.fetch_add(1, Ordering::SeqCst);
    let score = *fixture.eval_score.lock().unwrap();
    Json(serde_json::json!({ "evaluation": score }))
}

/// Bind the fixture on an ephemeral port and build a `Config` pointing the
/// engine at it, with short delays so tests stay fast.
pub async fn spawn_fixture() -> (Arc<Fixture>, Config) {
    let fixture = Arc::new(Fixture::new());

    let app = Router::new()
        .route("/api/stream/broadcast/round/{file}", get(stream_handler))
        .route("/api/broadcast/-/-/{round}", get(snapshot_handler))
        .route("/eval", get(eval_handler))
        .with_state(Arc::clone(&fixture));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        broadcast_api_base: format!("http://{addr}"),
        eval_api_url: format!("http://{addr}/eval"),
        poll_interval_secs: 1,
        reconnect_delay_secs: 1,
        error_retry_delay_secs: 1,
        snapshot_timeout_secs: 5,
        eval_timeout_secs: 5,
    };

    (fixture, config)
}
