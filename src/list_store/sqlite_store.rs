//! SQLite-backed list store implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

use super::models::*;
use super::schema::migrate_if_needed;
use super::trait_def::ListStore;
use crate::catalog::RecordKind;

#[derive(Clone)]
pub struct SqliteListStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteListStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn =
            Connection::open(db_path.as_ref()).context("Failed to open list database")?;
        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let album_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM albums", [], |r| r.get(0))
            .unwrap_or(0);
        let list_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM lists", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened list db: {} lists, {} albums", list_count, album_count);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_album(row: &Row) -> rusqlite::Result<AlbumRecord> {
        let kind: Option<String> = row.get("discogs_kind")?;
        Ok(AlbumRecord {
            id: row.get("id")?,
            discogs_id: row.get("discogs_id")?,
            discogs_kind: kind.as_deref().and_then(RecordKind::from_str),
            discogs_artist_id: row.get("discogs_artist_id")?,
            title: row.get("title")?,
            artist: row.get("artist")?,
            year: row.get("year")?,
            cover_image: row.get("cover_image")?,
        })
    }

    fn row_to_list(row: &Row) -> rusqlite::Result<ListRecord> {
        Ok(ListRecord {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            period: row.get("period")?,
            source_url: row.get("source_url")?,
            is_public: row.get::<_, i64>("is_public")? != 0,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl ListStore for SqliteListStore {
    fn find_user_by_token(&self, token: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, name, role FROM users WHERE api_token = ?1",
                params![token],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(user.map(|(id, name, role)| UserRecord {
            id,
            name,
            role: UserRole::from_str(&role).unwrap_or(UserRole::User),
        }))
    }

    fn create_user(&self, name: &str, role: UserRole, api_token: &str) -> Result<UserRecord> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO users (id, name, role, api_token) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, role.as_str(), api_token],
        )?;
        Ok(UserRecord {
            id,
            name: name.to_string(),
            role,
        })
    }

    fn get_list(&self, id: &str) -> Result<Option<ListRecord>> {
        let conn = self.conn.lock().unwrap();
        let list = conn
            .query_row(
                "SELECT id, title, description, period, source_url, is_public, user_id, created_at
                 FROM lists WHERE id = ?1",
                params![id],
                Self::row_to_list,
            )
            .optional()?;
        Ok(list)
    }

    fn create_list(&self, new_list: NewList) -> Result<ListRecord> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO lists (id, title, description, period, source_url, is_public, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                new_list.title,
                new_list.description,
                new_list.period,
                new_list.source_url,
                new_list.is_public as i64,
                new_list.user_id,
                created_at
            ],
        )?;
        Ok(ListRecord {
            id,
            title: new_list.title,
            description: new_list.description,
            period: new_list.period,
            source_url: new_list.source_url,
            is_public: new_list.is_public,
            user_id: new_list.user_id,
            created_at,
        })
    }

    fn get_album(&self, id: &str) -> Result<Option<AlbumRecord>> {
        let conn = self.conn.lock().unwrap();
        let album = conn
            .query_row(
                "SELECT id, discogs_id, discogs_kind, discogs_artist_id, title, artist, year, cover_image
                 FROM albums WHERE id = ?1",
                params![id],
                Self::row_to_album,
            )
            .optional()?;
        Ok(album)
    }

    fn find_album_by_catalog_id(&self, discogs_id: &str) -> Result<Option<AlbumRecord>> {
        let conn = self.conn.lock().unwrap();
        let album = conn
            .query_row(
                "SELECT id, discogs_id, discogs_kind, discogs_artist_id, title, artist, year, cover_image
                 FROM albums WHERE discogs_id = ?1",
                params![discogs_id],
                Self::row_to_album,
            )
            .optional()?;
        Ok(album)
    }

    fn upsert_album(&self, new_album: NewAlbum) -> Result<AlbumRecord> {
        {
            let conn = self.conn.lock().unwrap();
            let id = Uuid::new_v4().to_string();
            // The unique constraint on discogs_id is the duplicate
            // guard; a concurrent insert wins and we read it back below.
            conn.execute(
                "INSERT INTO albums (id, discogs_id, discogs_kind, discogs_artist_id, title, artist, year, cover_image)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(discogs_id) DO NOTHING",
                params![
                    id,
                    new_album.discogs_id,
                    new_album.discogs_kind.map(|k| k.as_str()),
                    new_album.discogs_artist_id,
                    new_album.title,
                    new_album.artist,
                    new_album.year,
                    new_album.cover_image
                ],
            )?;
        }

        self.find_album_by_catalog_id(&new_album.discogs_id)?
            .context("album vanished after upsert")
    }

    fn update_album_metadata(&self, id: &str, update: AlbumMetadataUpdate) -> Result<AlbumRecord> {
        {
            let conn = self.conn.lock().unwrap();
            let changed = conn.execute(
                "UPDATE albums
                 SET discogs_id = ?2, discogs_kind = ?3, discogs_artist_id = ?4,
                     title = ?5, artist = ?6, year = ?7, cover_image = ?8
                 WHERE id = ?1",
                params![
                    id,
                    update.discogs_id,
                    update.discogs_kind.map(|k| k.as_str()),
                    update.discogs_artist_id,
                    update.title,
                    update.artist,
                    update.year,
                    update.cover_image
                ],
            )?;
            if changed == 0 {
                anyhow::bail!("album not found: {}", id);
            }
        }

        self.get_album(id)?.context("album vanished after update")
    }

    fn entry_exists(&self, list_id: &str, album_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM list_albums WHERE list_id = ?1 AND album_id = ?2",
            params![list_id, album_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn add_album_to_list(&self, list_id: &str, album_id: &str, position: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO list_albums (list_id, album_id, position)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(list_id, album_id) DO NOTHING",
            params![list_id, album_id, position],
        )?;
        Ok(inserted > 0)
    }

    fn next_position(&self, list_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(position) FROM list_albums WHERE list_id = ?1",
            params![list_id],
            |r| r.get(0),
        )?;
        Ok(max.map(|m| m + 1).unwrap_or(0))
    }

    fn list_entries(&self, list_id: &str) -> Result<Vec<ListEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.discogs_id, a.discogs_kind, a.discogs_artist_id,
                    a.title, a.artist, a.year, a.cover_image, la.position
             FROM list_albums la JOIN albums a ON a.id = la.album_id
             WHERE la.list_id = ?1
             ORDER BY la.position ASC",
        )?;
        let entries = stmt
            .query_map(params![list_id], |row| {
                Ok(ListEntry {
                    album: Self::row_to_album(row)?,
                    position: row.get("position")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
