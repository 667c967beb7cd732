//! Reversible encoding of viewing state for link sharing.
//!
//! Tokens are URL-safe base64 without padding. Encoding always produces the
//! compact pipe-delimited record; decoding additionally accepts the older
//! JSON record (explicit tournament id, full game identities, style
//! overrides) so existing links keep working.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use regex::Regex;
use serde::Deserialize;

use broadcast_core::game_state::GameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    #[default]
    Chroma,
    Transparent,
    Dark,
}

impl BackgroundMode {
    fn code(self) -> char {
        match self {
            BackgroundMode::Chroma => 'c',
            BackgroundMode::Transparent => 't',
            BackgroundMode::Dark => 'd',
        }
    }

    fn from_code(code: &str) -> Self {
        match code {
            "c" => BackgroundMode::Chroma,
            "t" => BackgroundMode::Transparent,
            _ => BackgroundMode::Dark,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "transparent" => BackgroundMode::Transparent,
            "dark" => BackgroundMode::Dark,
            _ => BackgroundMode::Chroma,
        }
    }
}

/// Everything a link needs to reconstruct a viewer's display configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareState {
    pub round_id: String,
    pub tournament_id: Option<String>,
    /// Tracked games in display order. Compact tokens carry shortened
    /// names; JSON tokens carry full identities.
    pub games: Vec<GameId>,
    pub background: BackgroundMode,
    pub style_overrides: Option<serde_json::Value>,
}

/// Shorten a player name to its last whitespace/comma-delimited token.
pub fn short_name(name: &str) -> &str {
    let re = Regex::new(r"[,\s]+").unwrap();
    re.split(name).filter(|t| !t.is_empty()).last().unwrap_or(name)
}

/// Build a compact token: `round|shortW~shortB,...|bgchar`, base64
/// URL-safe without padding.
pub fn encode(round_id: &str, games: &[GameId], background: BackgroundMode) -> String {
    let game_str = games
        .iter()
        .map(|g| format!("{}~{}", short_name(&g.white), short_name(&g.black)))
        .collect::<Vec<_>>()
        .join(",");
    let record = format!("{}|{}|{}", round_id, game_str, background.code());
    URL_SAFE_NO_PAD.encode(record)
}

/// Decode either token form. Never panics; any malformation yields `None`.
pub fn decode(token: &str) -> Option<ShareState> {
    let bytes = decode_base64(token)?;
    let text = String::from_utf8(bytes).ok()?;

    if text.contains('|') && !text.starts_with('{') {
        decode_compact(&text)
    } else {
        decode_json(&text)
    }
}

/// Undo the URL-safe substitution and restore padding; older JSON tokens
/// were plain standard base64, so fall back to decoding the raw input.
fn decode_base64(token: &str) -> Option<Vec<u8>> {
    let mut translated = token.replace('-', "+").replace('_', "/");
    while translated.len() % 4 != 0 {
        translated.push('=');
    }
    STANDARD
        .decode(&translated)
        .ok()
        .or_else(|| STANDARD.decode(token).ok())
}

fn decode_compact(text: &str) -> Option<ShareState> {
    let mut parts = text.split('|');
    let round_id = parts.next()?.to_string();
    if round_id.is_empty() {
        return None;
    }
    let games_str = parts.next().unwrap_or("");
    let bg = parts.next().unwrap_or("d");

    let games = games_str
        .split(',')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (white, black) = pair.split_once('~')?;
            Some(GameId::new(white, black))
        })
        .collect();

    Some(ShareState {
        round_id,
        tournament_id: None,
        games,
        background: BackgroundMode::from_code(bg),
        style_overrides: None,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonShare {
    tournament_id: Option<String>,
    round_id: String,
    #[serde(rename = "gameIDs", default)]
    game_ids: Vec<String>,
    custom_styles: Option<serde_json::Value>,
    background_mode: Option<String>,
}

fn decode_json(text: &str) -> Option<ShareState> {
    let parsed: JsonShare = serde_json::from_str(text).ok()?;
    if parsed.round_id.is_empty() {
        return None;
    }

    let games = parsed
        .game_ids
        .iter()
        .filter_map(|entry| {
            let (white, black) = entry.split_once("-vs-")?;
            Some(GameId::new(white, black))
        })
        .collect();

    Some(ShareState {
        round_id: parsed.round_id,
        tournament_id: parsed.tournament_id,
        games,
        background: parsed
            .background_mode
            .as_deref()
            .map(BackgroundMode::from_name)
            .unwrap_or_default(),
        style_overrides: parsed.custom_styles,
    })
}
