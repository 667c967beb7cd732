//! Live game-state synchronization engine for chess broadcast overlays.
//!
//! Ingests a continuously-updated multi-game PGN stream (with a polled JSON
//! snapshot fallback), accumulates the latest record per game, reconciles
//! derived state into the tracked subset, requests evaluations on position
//! change, and encodes/decodes shareable viewing-state tokens.

pub mod accumulator;
pub mod clients;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod reconcile;
pub mod session;
pub mod share;
pub mod tracker;

pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use session::IngestMode;
pub use share::{BackgroundMode, ShareState};
pub use tracker::TrackedGame;
