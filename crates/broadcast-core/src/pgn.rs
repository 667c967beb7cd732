//! Multi-game PGN blob handling: record splitting and identity extraction.
//!
//! Broadcast feeds separate games with two consecutive blank lines. Splitting
//! is stateless and restartable; a record missing a White or Black header is
//! skipped rather than treated as an error.

use regex::Regex;

use crate::game_state::GameId;

/// Boundary between game records in a multi-game blob.
pub const GAME_BOUNDARY: &str = "\n\n\n";

/// Split a multi-game PGN blob into individual game records, in order,
/// skipping blank segments.
pub fn split_games(blob: &str) -> impl Iterator<Item = &str> {
    blob.split(GAME_BOUNDARY).filter(|g| !g.trim().is_empty())
}

/// Read a record's identity from its `White`/`Black` header tags.
pub fn game_identity(record: &str) -> Option<GameId> {
    let white = header_value(record, "White")?;
    let black = header_value(record, "Black")?;
    Some(GameId::new(white, black))
}

/// Split a blob and pair each record with its identity; records without
/// one are excluded from the results.
pub fn split_with_identities(blob: &str) -> impl Iterator<Item = (GameId, &str)> {
    split_games(blob).filter_map(|record| game_identity(record).map(|id| (id, record)))
}

/// Extract a string value from a PGN header tag (e.g. White, Result).
pub fn header_value(record: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(record)?.get(1)?.as_str().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = "[White \"Player A\"]\n[Black \"Player B\"]\n\n1. e4 e5 *\n\n\n[White \"Player C\"]\n[Black \"Player D\"]\n\n1. d4 d5 *\n\n\n";

    #[test]
    fn test_split_preserves_order() {
        let ids: Vec<GameId> = split_with_identities(BLOB).map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                GameId::new("Player A", "Player B"),
                GameId::new("Player C", "Player D"),
            ]
        );
    }

    #[test]
    fn test_record_without_black_header_is_skipped() {
        let blob = "[White \"Solo\"]\n\n1. e4 *\n\n\n[White \"X\"]\n[Black \"Y\"]\n\n1. d4 *";
        let ids: Vec<GameId> = split_with_identities(blob).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![GameId::new("X", "Y")]);
    }

    #[test]
    fn test_blank_segments_excluded() {
        assert_eq!(split_games("\n\n\n  \n\n\n").count(), 0);
        assert_eq!(split_games(BLOB).count(), 2);
    }

    #[test]
    fn test_header_value() {
        let record = "[White \"A\"]\n[Result \"1-0\"]\n";
        assert_eq!(header_value(record, "White"), Some("A".to_string()));
        assert_eq!(header_value(record, "Result"), Some("1-0".to_string()));
        assert_eq!(header_value(record, "Black"), None);
    }
}
