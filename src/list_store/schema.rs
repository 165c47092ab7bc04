//! SQLite schema for the list store.
//!
//! Schemas are versioned; `PRAGMA user_version` tracks the applied
//! version and pending migrations run in one transaction on open.
//! Uniqueness of the catalog id and of (list, album) pairs is enforced
//! here rather than by application-level checks.

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// One schema version: full DDL for fresh databases, or a migration
/// from the previous version.
pub struct SchemaVersion {
    pub version: i64,
    pub sql: &'static str,
}

pub const SCHEMA_VERSIONS: &[SchemaVersion] = &[SchemaVersion {
    version: 1,
    sql: "
        CREATE TABLE users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            api_token TEXT NOT NULL UNIQUE
        );

        CREATE TABLE lists (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            period TEXT,
            source_url TEXT,
            is_public INTEGER NOT NULL DEFAULT 0,
            user_id TEXT NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL
        );

        CREATE TABLE albums (
            id TEXT PRIMARY KEY,
            discogs_id TEXT NOT NULL UNIQUE,
            discogs_kind TEXT,
            discogs_artist_id TEXT,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            year INTEGER,
            cover_image TEXT
        );

        CREATE TABLE list_albums (
            list_id TEXT NOT NULL REFERENCES lists(id),
            album_id TEXT NOT NULL REFERENCES albums(id),
            position INTEGER NOT NULL,
            UNIQUE(list_id, album_id)
        );

        CREATE INDEX idx_albums_discogs_id ON albums(discogs_id);
        CREATE INDEX idx_list_albums_list ON list_albums(list_id);
    ",
}];

/// Apply any pending schema versions.
pub fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let latest = SCHEMA_VERSIONS.last().map(|s| s.version).unwrap_or(0);

    if current >= latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in SCHEMA_VERSIONS.iter().filter(|s| s.version > current) {
        info!("Migrating list db to schema version {}", schema.version);
        tx.execute_batch(schema.sql)?;
    }
    tx.pragma_update(None, "user_version", latest)?;
    tx.commit()?;

    Ok(())
}
