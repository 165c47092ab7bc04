//! Data models for the Discogs catalog client.
//!
//! Raw response shapes are parsed once at the HTTP boundary and mapped
//! into `CandidateRecord` / `CatalogAlbum`; the record kind is decided
//! there and never re-inferred downstream.

use serde::{Deserialize, Serialize};

use super::text::{clean_artist_name, extract_album_title, extract_artist_from_title};

/// Kind of catalog record.
///
/// A master groups all pressings/editions of a work; a release is one
/// specific pressing. Some catalog ids only resolve under one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Master,
    Release,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Master => "master",
            RecordKind::Release => "release",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "master" => Some(RecordKind::Master),
            "release" => Some(RecordKind::Release),
            _ => None,
        }
    }
}

/// One catalog search hit, normalized from the raw search response.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub id: String,
    pub kind: RecordKind,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub cover_image: Option<String>,
    pub thumb: Option<String>,
}

/// Full album metadata from a catalog detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogAlbum {
    pub id: String,
    pub kind: RecordKind,
    pub title: String,
    pub artist: String,
    pub catalog_artist_id: Option<String>,
    pub year: Option<i32>,
    pub cover_image: Option<String>,
}

// =============================================================================
// Raw Discogs response shapes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct RawSearchResponse {
    #[serde(default)]
    pub results: Vec<RawSearchResult>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawSearchResult {
    pub id: serde_json::Value,
    pub title: String,
    pub year: Option<String>,
    pub thumb: Option<String>,
    pub cover_image: Option<String>,
}

impl RawSearchResult {
    /// Map a raw search hit into a candidate of the given kind.
    ///
    /// Search titles come combined as "Artist - Title"; the year field
    /// is a string in search responses.
    pub fn into_candidate(self, kind: RecordKind) -> CandidateRecord {
        let id = json_id_to_string(&self.id);
        let artist = extract_artist_from_title(&self.title);
        let title = extract_album_title(&self.title);
        let year = self.year.as_deref().and_then(|y| y.parse::<i32>().ok());
        let cover_image = self.cover_image.or_else(|| self.thumb.clone());
        CandidateRecord {
            id,
            kind,
            title,
            artist,
            year,
            cover_image,
            thumb: self.thumb,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RawDetailsResponse {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<RawDetailsArtist>,
    pub year: Option<i32>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    pub thumb: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawDetailsArtist {
    pub id: Option<serde_json::Value>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawImage {
    pub uri: Option<String>,
    pub resource_url: Option<String>,
}

impl RawDetailsResponse {
    /// Map a raw detail response into a `CatalogAlbum` of the given kind.
    pub fn into_album(self, kind: RecordKind) -> CatalogAlbum {
        let first_artist = self.artists.first();
        let artist_name = first_artist
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| extract_artist_from_title(&self.title));
        let catalog_artist_id = first_artist
            .and_then(|a| a.id.as_ref())
            .map(json_id_to_string);
        let cover_image = self
            .images
            .first()
            .and_then(|i| i.uri.clone().or_else(|| i.resource_url.clone()))
            .or(self.thumb);
        CatalogAlbum {
            id: json_id_to_string(&self.id),
            kind,
            title: self.title,
            artist: clean_artist_name(&artist_name),
            catalog_artist_id,
            year: self.year,
            cover_image,
        }
    }
}

/// Discogs ids are numeric in the API but strings everywhere here.
fn json_id_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_round_trip() {
        for kind in [RecordKind::Master, RecordKind::Release] {
            assert_eq!(RecordKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::from_str("bogus"), None);
    }

    #[test]
    fn test_search_result_into_candidate() {
        let raw = RawSearchResult {
            id: serde_json::json!(12345),
            title: "Pink Floyd - The Wall".to_string(),
            year: Some("1979".to_string()),
            thumb: Some("http://img/thumb.jpg".to_string()),
            cover_image: Some("http://img/cover.jpg".to_string()),
        };
        let candidate = raw.into_candidate(RecordKind::Master);
        assert_eq!(candidate.id, "12345");
        assert_eq!(candidate.artist, "Pink Floyd");
        assert_eq!(candidate.title, "The Wall");
        assert_eq!(candidate.year, Some(1979));
        assert_eq!(candidate.kind, RecordKind::Master);
        assert_eq!(candidate.cover_image.as_deref(), Some("http://img/cover.jpg"));
    }

    #[test]
    fn test_search_result_falls_back_to_thumb() {
        let raw = RawSearchResult {
            id: serde_json::json!(1),
            title: "Someone - Something".to_string(),
            year: None,
            thumb: Some("http://img/thumb.jpg".to_string()),
            cover_image: None,
        };
        let candidate = raw.into_candidate(RecordKind::Release);
        assert_eq!(candidate.cover_image.as_deref(), Some("http://img/thumb.jpg"));
    }

    #[test]
    fn test_details_into_album_cleans_artist() {
        let raw = RawDetailsResponse {
            id: serde_json::json!(99),
            title: "Some Album".to_string(),
            artists: vec![RawDetailsArtist {
                id: Some(serde_json::json!(42)),
                name: Some("Mike Davis (2)".to_string()),
            }],
            year: Some(1971),
            images: vec![RawImage {
                uri: Some("http://img/full.jpg".to_string()),
                resource_url: None,
            }],
            thumb: None,
        };
        let album = raw.into_album(RecordKind::Release);
        assert_eq!(album.artist, "Mike Davis");
        assert_eq!(album.catalog_artist_id.as_deref(), Some("42"));
        assert_eq!(album.cover_image.as_deref(), Some("http://img/full.jpg"));
    }

    #[test]
    fn test_details_without_artists_splits_title() {
        let raw = RawDetailsResponse {
            id: serde_json::json!(7),
            title: "Pink Floyd - The Wall".to_string(),
            artists: vec![],
            year: None,
            images: vec![],
            thumb: None,
        };
        let album = raw.into_album(RecordKind::Master);
        assert_eq!(album.artist, "Pink Floyd");
        assert!(album.catalog_artist_id.is_none());
    }
}
