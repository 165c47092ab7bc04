//! Text normalization for catalog records.
//!
//! Discogs search results combine artist and album into a single
//! "Artist - Title" string, and artist display names carry a numeric
//! disambiguation suffix like "(2)". These helpers undo both at the
//! response boundary so the rest of the code only sees clean fields.

use regex::Regex;
use std::sync::OnceLock;

const TITLE_SEPARATOR: &str = " - ";

/// Extract the artist part from a combined "Artist - Title" string.
///
/// Strings without the separator yield "Unknown Artist".
pub fn extract_artist_from_title(combined: &str) -> String {
    match combined.split_once(TITLE_SEPARATOR) {
        Some((artist, _)) => artist.to_string(),
        None => "Unknown Artist".to_string(),
    }
}

/// Extract the album title part from a combined "Artist - Title" string.
///
/// Only the first separator splits; titles containing " - " themselves
/// are preserved. Strings without the separator are returned unchanged.
pub fn extract_album_title(combined: &str) -> String {
    match combined.split_once(TITLE_SEPARATOR) {
        Some((_, title)) => title.to_string(),
        None => combined.to_string(),
    }
}

fn numeric_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(\d+\)\s*$").unwrap())
}

/// Strip a trailing numeric disambiguation suffix from an artist name.
///
/// "Mike Davis (2)" becomes "Mike Davis"; non-numeric parentheticals
/// like "Artist (US)" are left alone.
pub fn clean_artist_name(artist: &str) -> String {
    numeric_suffix_regex().replace(artist, "").trim().to_string()
}
