//! The import reconciliation engine.
//!
//! Resolves each parsed input row to a canonical album record and a
//! positioned list entry, preferring (in order) an explicit catalog id,
//! a fuzzy catalog search, and finally a placeholder record. Rows are
//! processed strictly sequentially: the catalog client's throttle clock
//! and the store's duplicate guards assume one in-flight row per
//! import. One row's failure never aborts the batch.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogAlbum, CatalogClient, CandidateRecord};
use crate::list_store::{ListStore, NewAlbum};
use crate::matching::score_candidates;

use super::events::{ImportEvent, ImportReport};
use super::parser::{ImportRow, ParsedLine, PLACEHOLDER_PREFIX};

pub struct ImportEngine {
    store: Arc<dyn ListStore>,
    catalog: Arc<dyn CatalogClient>,
}

/// How a row was resolved; `None` means the album was already in the
/// list and the row was a no-op.
type RowOutcome = Option<String>;

impl ImportEngine {
    pub fn new(store: Arc<dyn ListStore>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { store, catalog }
    }

    /// Process all lines for one target list, emitting a progress event
    /// per line. Returns the accumulated report; the caller emits the
    /// terminal event.
    ///
    /// Processing stops early if the event receiver goes away (client
    /// disconnect), checked between rows.
    pub async fn run(
        &self,
        list_id: &str,
        lines: Vec<ParsedLine>,
        tx: &mpsc::Sender<ImportEvent>,
    ) -> ImportReport {
        let total = lines.len();
        let mut report = ImportReport::default();

        for (index, line) in lines.into_iter().enumerate() {
            let message = match line {
                ParsedLine::Invalid(error) => {
                    report.errors.push(error);
                    "Skipped invalid line".to_string()
                }
                ParsedLine::Row(row) => {
                    let desc = format!("{} - {}", row.artist, row.title);
                    match self.process_row(list_id, &row).await {
                        Ok(Some(imported_desc)) => {
                            report.imported.push(imported_desc);
                            desc
                        }
                        Ok(None) => {
                            debug!("Album already in list, skipping: {}", desc);
                            desc
                        }
                        Err(e) => {
                            warn!("Row failed ({}): {:#}", desc, e);
                            report.errors.push(format!("Error: {}", desc));
                            desc
                        }
                    }
                }
            };

            let event = ImportEvent::progress(index + 1, total, message);
            if tx.send(event).await.is_err() {
                info!("Import consumer went away, stopping after {} rows", index + 1);
                break;
            }
        }

        report
    }

    /// Resolve one row per the priority order: explicit id, fuzzy
    /// search, placeholder.
    async fn process_row(&self, list_id: &str, row: &ImportRow) -> anyhow::Result<RowOutcome> {
        match &row.external_id {
            Some(id) => self.process_row_with_id(list_id, row, id).await,
            None => self.process_row_by_search(list_id, row).await,
        }
    }

    async fn process_row_with_id(
        &self,
        list_id: &str,
        row: &ImportRow,
        catalog_id: &str,
    ) -> anyhow::Result<RowOutcome> {
        let desc = format!("{} - {}", row.artist, row.title);

        if let Some(album) = self.store.find_album_by_catalog_id(catalog_id)? {
            let inserted = self.attach(list_id, &album.id, row)?;
            return Ok(inserted.then_some(desc));
        }

        // Unknown id: fetch metadata, degrading to row-supplied fields
        // when the catalog cannot answer. Both are successful imports.
        let (new_album, suffix) = match self.catalog.fetch_details(catalog_id, None).await {
            Ok(details) => (album_from_details(catalog_id, details, row), ""),
            Err(e) => {
                warn!("Catalog lookup for id {} failed ({}), importing row fields only", catalog_id, e);
                (album_from_row(catalog_id.to_string(), row), " (limited info)")
            }
        };

        let album = self.store.upsert_album(new_album)?;
        let inserted = self.attach(list_id, &album.id, row)?;
        Ok(inserted.then(|| format!("{}{}", desc, suffix)))
    }

    async fn process_row_by_search(
        &self,
        list_id: &str,
        row: &ImportRow,
    ) -> anyhow::Result<RowOutcome> {
        let desc = format!("{} - {}", row.artist, row.title);

        let candidates = match self
            .catalog
            .search_by_artist_and_title(&row.artist, &row.title)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                // Unreachable catalog degrades to the no-match branch
                warn!("Catalog search failed ({}), treating as no match", e);
                Vec::new()
            }
        };

        let scored = score_candidates(candidates, &row.artist, &row.title);

        let Some(top) = scored.into_iter().next() else {
            let placeholder = placeholder_id();
            debug!("No catalog match for {}, creating placeholder {}", desc, placeholder);
            let album = self.store.upsert_album(album_from_row(placeholder, row))?;
            let inserted = self.attach(list_id, &album.id, row)?;
            return Ok(inserted.then(|| format!("{} (no catalog match)", desc)));
        };

        let candidate = top.candidate;
        let album = match self.store.find_album_by_catalog_id(&candidate.id)? {
            Some(existing) => {
                debug!("Reusing album {} for {}", existing.discogs_id, desc);
                existing
            }
            None => {
                let new_album = match self
                    .catalog
                    .fetch_details(&candidate.id, Some(candidate.kind))
                    .await
                {
                    Ok(details) => album_from_details(&candidate.id, details, row),
                    Err(e) => {
                        warn!(
                            "Details fetch for {} failed ({}), using search fields",
                            candidate.id, e
                        );
                        album_from_candidate(&candidate, row)
                    }
                };
                self.store.upsert_album(new_album)?
            }
        };

        let inserted = self.attach(list_id, &album.id, row)?;
        Ok(inserted.then_some(desc))
    }

    /// Create the list entry unless the album is already in the list.
    /// Position is the row's declared rank, else append-at-end.
    fn attach(&self, list_id: &str, album_id: &str, row: &ImportRow) -> anyhow::Result<bool> {
        if self.store.entry_exists(list_id, album_id)? {
            return Ok(false);
        }
        let position = match row.rank {
            Some(rank) => rank as i64,
            None => self.store.next_position(list_id)?,
        };
        self.store.add_album_to_list(list_id, album_id, position)
    }
}

/// Synthesize a guaranteed-unique placeholder catalog id.
pub fn placeholder_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!(
        "{}{}-{}",
        PLACEHOLDER_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}

fn album_from_details(catalog_id: &str, details: CatalogAlbum, row: &ImportRow) -> NewAlbum {
    NewAlbum {
        discogs_id: catalog_id.to_string(),
        discogs_kind: Some(details.kind),
        discogs_artist_id: details
            .catalog_artist_id
            .or_else(|| row.catalog_artist_id.clone()),
        title: non_empty_or(details.title, &row.title),
        artist: non_empty_or(details.artist, &row.artist),
        year: details.year.or(row.year),
        cover_image: details.cover_image.or_else(|| row.cover_image.clone()),
    }
}

fn album_from_candidate(candidate: &CandidateRecord, row: &ImportRow) -> NewAlbum {
    NewAlbum {
        discogs_id: candidate.id.clone(),
        discogs_kind: Some(candidate.kind),
        discogs_artist_id: row.catalog_artist_id.clone(),
        title: non_empty_or(candidate.title.clone(), &row.title),
        artist: non_empty_or(candidate.artist.clone(), &row.artist),
        year: candidate.year.or(row.year),
        cover_image: candidate
            .cover_image
            .clone()
            .or_else(|| row.cover_image.clone()),
    }
}

fn album_from_row(discogs_id: String, row: &ImportRow) -> NewAlbum {
    NewAlbum {
        discogs_id,
        discogs_kind: None,
        discogs_artist_id: row.catalog_artist_id.clone(),
        title: row.title.clone(),
        artist: row.artist.clone(),
        year: row.year,
        cover_image: row.cover_image.clone(),
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
