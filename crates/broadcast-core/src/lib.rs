//! Pure derivation logic for live chess broadcasts: clock conversions,
//! multi-game PGN splitting, and per-game state extraction.
//!
//! Everything here is synchronous and allocation-light; the async ingestion
//! engine lives in the `broadcast-sync` crate.

pub mod clock;
pub mod extract;
pub mod game_state;
pub mod pgn;
