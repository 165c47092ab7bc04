//! Data models for the list store.

use serde::Serialize;

use crate::catalog::RecordKind;

/// Role of a user. Admin unlocks the catalog-correction endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub period: Option<String>,
    pub source_url: Option<String>,
    pub is_public: bool,
    pub user_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewList {
    pub title: String,
    pub description: Option<String>,
    pub period: Option<String>,
    pub source_url: Option<String>,
    pub is_public: bool,
    pub user_id: String,
}

/// The canonical, deduplicated representation of one album.
///
/// `discogs_id` is unique across all albums; placeholder ids (prefix
/// "unknown-") mark records that never matched the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumRecord {
    pub id: String,
    pub discogs_id: String,
    pub discogs_kind: Option<RecordKind>,
    pub discogs_artist_id: Option<String>,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub discogs_id: String,
    pub discogs_kind: Option<RecordKind>,
    pub discogs_artist_id: Option<String>,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub cover_image: Option<String>,
}

/// Metadata overwrite applied by an admin correction.
#[derive(Debug, Clone)]
pub struct AlbumMetadataUpdate {
    pub discogs_id: String,
    pub discogs_kind: Option<RecordKind>,
    pub discogs_artist_id: Option<String>,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub cover_image: Option<String>,
}

/// One positioned album within a list.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub album: AlbumRecord,
    pub position: i64,
}
