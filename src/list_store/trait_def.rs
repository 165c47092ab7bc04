//! ListStore trait definition.
//!
//! Abstracts the relational store so the import engine and HTTP
//! handlers can run against the SQLite implementation in production
//! and an in-memory database in tests.

use anyhow::Result;

use super::models::*;

pub trait ListStore: Send + Sync {
    // =========================================================================
    // Identity (narrow collaborator: token lookup only)
    // =========================================================================

    /// Resolve a user from their API token.
    fn find_user_by_token(&self, token: &str) -> Result<Option<UserRecord>>;

    /// Create a user with the given token. Used by provisioning and tests.
    fn create_user(&self, name: &str, role: UserRole, api_token: &str) -> Result<UserRecord>;

    // =========================================================================
    // Lists
    // =========================================================================

    fn get_list(&self, id: &str) -> Result<Option<ListRecord>>;

    fn create_list(&self, new_list: NewList) -> Result<ListRecord>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn get_album(&self, id: &str) -> Result<Option<AlbumRecord>>;

    /// Look up an album by its external catalog id.
    fn find_album_by_catalog_id(&self, discogs_id: &str) -> Result<Option<AlbumRecord>>;

    /// Insert an album, or return the existing record when the catalog
    /// id is already taken. Uniqueness lives in the schema, not in a
    /// check-then-create.
    fn upsert_album(&self, new_album: NewAlbum) -> Result<AlbumRecord>;

    /// Overwrite an album's metadata (admin correction).
    fn update_album_metadata(&self, id: &str, update: AlbumMetadataUpdate)
        -> Result<AlbumRecord>;

    // =========================================================================
    // List entries
    // =========================================================================

    /// Whether the list already references the album.
    fn entry_exists(&self, list_id: &str, album_id: &str) -> Result<bool>;

    /// Attach an album to a list at the given position. Returns false
    /// when the (list, album) pair already exists (conflict ignored).
    fn add_album_to_list(&self, list_id: &str, album_id: &str, position: i64) -> Result<bool>;

    /// Next free position at the end of a list.
    fn next_position(&self, list_id: &str) -> Result<i64>;

    /// All entries of a list ordered by position.
    fn list_entries(&self, list_id: &str) -> Result<Vec<ListEntry>>;
}
