//! Derives displayable state from a single game's PGN record.

use regex::Regex;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use crate::clock::clock_to_seconds;
use crate::game_state::{ActiveSide, GameResult, GameState};
use crate::pgn::header_value;

/// Compute the derived state for one game record.
///
/// Replay is defensive: the first move shakmaty rejects ends the replay and
/// the position as of the last legal move is kept. A record that cannot be
/// processed at all yields `None`; extraction never panics, so one malformed
/// record cannot take down a batch.
pub fn extract_game_state(record: &str) -> Option<GameState> {
    let pos = final_position(record)?;
    let last_fen = Fen::from_position(&pos, EnPassantMode::Legal).to_string();

    let clocks = collect_clocks(record);

    // Clocks alternate strictly White, Black, White, ... in ply order, so
    // the parity of the count says who moved last.
    let (white_clock, black_clock, active_side) = match clocks.len() {
        0 => (0, 0, ActiveSide::Unknown),
        1 => (clocks[0], 0, ActiveSide::Black),
        n if n % 2 == 0 => (clocks[n - 2], clocks[n - 1], ActiveSide::White),
        n => (clocks[n - 1], clocks[n - 2], ActiveSide::Black),
    };

    let move_number = clocks.len() as u32 / 2 + 1;

    let result = match header_value(record, "Result") {
        Some(token) => GameResult::parse(&token),
        None => trailing_result(record),
    };

    Some(GameState {
        last_fen,
        result,
        white_clock,
        black_clock,
        active_side,
        move_number,
    })
}

/// Replay the recorded moves from the starting position (FEN header or the
/// standard setup) and return the last legally reached position.
fn final_position(record: &str) -> Option<Chess> {
    let mut pos: Chess = match header_value(record, "FEN") {
        Some(fen) => fen
            .parse::<Fen>()
            .ok()?
            .into_position(CastlingMode::Standard)
            .ok()?,
        None => Chess::default(),
    };

    for san_str in extract_moves(record) {
        let san: San = match san_str.parse() {
            Ok(s) => s,
            Err(_) => break,
        };
        let mv = match san.to_move(&pos) {
            Ok(m) => m,
            Err(_) => break,
        };
        pos.play_unchecked(mv);
    }

    Some(pos)
}

/// Extract SAN moves from PGN text (after removing headers, comments,
/// variations).
fn extract_moves(record: &str) -> Vec<String> {
    // Remove headers
    let header_re = Regex::new(r"\[[^\]]*\]").unwrap();
    let no_headers = header_re.replace_all(record, "");

    // Remove comments
    let comment_re = Regex::new(r"\{[^}]*\}").unwrap();
    let no_comments = comment_re.replace_all(&no_headers, "");

    // Remove variations
    let variation_re = Regex::new(r"\([^)]*\)").unwrap();
    let no_variations = variation_re.replace_all(&no_comments, "");

    let move_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O").unwrap();

    move_re
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Collect `[%clk H:MM:SS]` annotations in ply order, as seconds.
fn collect_clocks(record: &str) -> Vec<u32> {
    let clk_re = Regex::new(r"\[%clk (\d+:\d+:\d+)\]").unwrap();
    clk_re
        .captures_iter(record)
        .filter_map(|cap| clock_to_seconds(&cap[1]))
        .collect()
}

/// Movetext may end with a bare result token instead of carrying a Result
/// header.
fn trailing_result(record: &str) -> GameResult {
    let re = Regex::new(r"(1-0|0-1|1/2-1/2)$").unwrap();
    match re.captures(record.trim_end()) {
        Some(cap) => GameResult::parse(&cap[1]),
        None => GameResult::Ongoing,
    }
}
