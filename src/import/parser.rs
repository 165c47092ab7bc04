//! Import payload parsing.
//!
//! Two payload shapes are accepted: a delimited-text export
//! (rank, artist, title, optional year, optional catalog id) and a
//! structured JSON document carrying list metadata plus album entries.
//! Both are tokenized into `ParsedLine`s; malformed lines become
//! `Invalid` entries instead of aborting the batch, so the engine can
//! report them per-row.

use serde::Deserialize;
use thiserror::Error;

/// Prefix of synthesized placeholder catalog ids. Placeholder ids are
/// never matched against by id, only by content.
pub const PLACEHOLDER_PREFIX: &str = "unknown-";

/// One normalized input row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// Positional hint; entries without one are appended at the end.
    pub rank: Option<u32>,
    pub artist: String,
    pub title: String,
    pub year: Option<i32>,
    /// Explicit catalog id, when the payload supplied a real one.
    pub external_id: Option<String>,
    pub catalog_artist_id: Option<String>,
    pub cover_image: Option<String>,
}

/// Outcome of parsing one data line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Row(ImportRow),
    /// Parse error message containing the offending line.
    Invalid(String),
}

/// Fatal payload-shape errors (the whole import is rejected).
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON file")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid file format: expected \"list\" and \"albums\" fields")]
    InvalidShape,
}

// =============================================================================
// Delimited text (CSV-like)
// =============================================================================

/// Detect the field separator for the whole payload: semicolon only
/// when the payload has semicolons and no commas at all.
fn detect_separator(text: &str) -> char {
    if text.contains(';') && !text.contains(',') {
        ';'
    } else {
        ','
    }
}

/// Trim a field, strip one pair of surrounding quotes and un-escape
/// doubled quotes.
fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(trimmed);
    unquoted.replace("\"\"", "\"").trim().to_string()
}

/// Parse a delimited-text payload into lines.
///
/// The first non-blank line is a header and is skipped; blank lines are
/// ignored. A data line needs at least rank, artist and title fields,
/// all non-blank, to become a row. A rank that is present but not
/// numeric is tolerated: the row is kept and appended at the end like
/// a row without one, since hand-edited files often carry ordinals
/// like "1." there.
pub fn parse_delimited(text: &str) -> Vec<ParsedLine> {
    let separator = detect_separator(text);

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1) // header
        .map(|line| parse_delimited_line(line, separator))
        .collect()
}

fn parse_delimited_line(line: &str, separator: char) -> ParsedLine {
    let fields: Vec<String> = line.split(separator).map(clean_field).collect();

    if fields.len() < 3 {
        return ParsedLine::Invalid(format!("Invalid line: {}", line));
    }

    let rank = &fields[0];
    let artist = &fields[1];
    let title = &fields[2];

    if rank.is_empty() || artist.is_empty() || title.is_empty() {
        return ParsedLine::Invalid(format!("Invalid line (missing fields): {}", line));
    }

    let year = fields.get(3).and_then(|f| f.parse::<i32>().ok());
    let external_id = fields
        .get(4)
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());

    ParsedLine::Row(ImportRow {
        rank: rank.parse::<u32>().ok(),
        artist: artist.clone(),
        title: title.clone(),
        year,
        external_id,
        catalog_artist_id: None,
        cover_image: None,
    })
}

// =============================================================================
// Structured JSON document
// =============================================================================

/// List metadata carried by a structured-document payload.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub period: Option<String>,
    #[serde(rename = "sourceUrl")]
    pub source_url: Option<String>,
    #[serde(rename = "isPublic", default)]
    pub is_public: bool,
}

/// A fully parsed structured-document payload.
#[derive(Debug)]
pub struct JsonPayload {
    pub list: ListMetadata,
    pub lines: Vec<ParsedLine>,
}

#[derive(Debug, Deserialize)]
struct RawJsonPayload {
    list: Option<ListMetadata>,
    albums: Option<Vec<RawJsonAlbum>>,
}

#[derive(Debug, Deserialize)]
struct RawJsonAlbum {
    rank: Option<u32>,
    artist: Option<String>,
    title: Option<String>,
    year: Option<i32>,
    #[serde(rename = "discogsId")]
    discogs_id: Option<String>,
    #[serde(rename = "discogsArtistId")]
    catalog_artist_id: Option<String>,
    #[serde(rename = "coverImage")]
    cover_image: Option<String>,
}

/// Parse a structured-document payload.
///
/// The top-level shape (`list` + `albums`) is validated up front and a
/// violation is fatal; individual album entries with missing fields
/// degrade to `Invalid` lines like delimited rows do.
pub fn parse_json(text: &str) -> Result<JsonPayload, PayloadError> {
    let raw: RawJsonPayload = serde_json::from_str(text)?;

    let (list, albums) = match (raw.list, raw.albums) {
        (Some(list), Some(albums)) => (list, albums),
        _ => return Err(PayloadError::InvalidShape),
    };

    let lines = albums.into_iter().map(parse_json_album).collect();

    Ok(JsonPayload { list, lines })
}

fn parse_json_album(raw: RawJsonAlbum) -> ParsedLine {
    let artist = raw.artist.unwrap_or_default();
    let title = raw.title.unwrap_or_default();

    if artist.trim().is_empty() || title.trim().is_empty() {
        return ParsedLine::Invalid("Invalid album entry: missing artist or title".to_string());
    }

    // A placeholder id from an earlier export is not a real catalog id
    let external_id = raw
        .discogs_id
        .filter(|id| !id.is_empty() && !id.starts_with(PLACEHOLDER_PREFIX));

    ParsedLine::Row(ImportRow {
        rank: raw.rank,
        artist,
        title,
        year: raw.year,
        external_id,
        catalog_artist_id: raw.catalog_artist_id,
        cover_image: raw.cover_image,
    })
}
