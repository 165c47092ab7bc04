//! End-to-end tests of the import reconciliation flow against an
//! in-memory store and a scripted catalog client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use listomania_server::catalog::{
    CandidateRecord, CatalogAlbum, CatalogClient, CatalogError, RecordKind,
};
use listomania_server::import::{parse_delimited, ImportEngine, ImportEvent};
use listomania_server::list_store::{ListStore, NewList, SqliteListStore, UserRole};

// =============================================================================
// Scripted catalog double
// =============================================================================

#[derive(Default)]
struct MockCatalog {
    /// Keyed by "artist|title".
    search_results: HashMap<String, Vec<CandidateRecord>>,
    /// Keyed by catalog id.
    details: HashMap<String, CatalogAlbum>,
    /// Ids whose detail fetches fail with a rate-limit error.
    throttled_ids: Vec<String>,
    /// "artist|title" keys whose searches fail with a rate-limit error.
    throttled_searches: Vec<String>,
    search_calls: AtomicUsize,
    details_calls: AtomicUsize,
}

impl MockCatalog {
    fn with_candidate(mut self, artist: &str, title: &str, candidate: CandidateRecord) -> Self {
        self.search_results
            .entry(format!("{}|{}", artist, title))
            .or_default()
            .push(candidate);
        self
    }

    fn with_details(mut self, album: CatalogAlbum) -> Self {
        self.details.insert(album.id.clone(), album);
        self
    }

    fn with_throttled_id(mut self, id: &str) -> Self {
        self.throttled_ids.push(id.to_string());
        self
    }

    fn with_throttled_search(mut self, artist: &str, title: &str) -> Self {
        self.throttled_searches.push(format!("{}|{}", artist, title));
        self
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn search_by_text(&self, query: &str) -> Result<Vec<CandidateRecord>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    async fn search_by_artist_and_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<CandidateRecord>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}|{}", artist, title);
        if self.throttled_searches.contains(&key) {
            return Err(CatalogError::RateLimitExceeded(3));
        }
        Ok(self.search_results.get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_details(
        &self,
        id: &str,
        _kind: Option<RecordKind>,
    ) -> Result<CatalogAlbum, CatalogError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if self.throttled_ids.iter().any(|t| t == id) {
            return Err(CatalogError::RateLimitExceeded(3));
        }
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("no record {}", id)))
    }
}

fn candidate(id: &str, artist: &str, title: &str) -> CandidateRecord {
    CandidateRecord {
        id: id.to_string(),
        kind: RecordKind::Master,
        title: title.to_string(),
        artist: artist.to_string(),
        year: Some(1979),
        cover_image: None,
        thumb: None,
    }
}

fn details(id: &str, artist: &str, title: &str, year: i32) -> CatalogAlbum {
    CatalogAlbum {
        id: id.to_string(),
        kind: RecordKind::Master,
        title: title.to_string(),
        artist: artist.to_string(),
        catalog_artist_id: Some("42".to_string()),
        year: Some(year),
        cover_image: Some(format!("https://img.example/{}.jpg", id)),
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    store: Arc<SqliteListStore>,
    list_id: String,
}

fn make_harness() -> Harness {
    let store = Arc::new(SqliteListStore::in_memory().unwrap());
    let user = store
        .create_user("tester", UserRole::User, "test-token")
        .unwrap();
    let list = store
        .create_list(NewList {
            title: "Test list".to_string(),
            description: None,
            period: None,
            source_url: None,
            is_public: false,
            user_id: user.id,
        })
        .unwrap();
    Harness {
        store,
        list_id: list.id,
    }
}

/// Run the engine over the given CSV and collect every emitted event.
async fn run_import(
    harness: &Harness,
    catalog: Arc<dyn CatalogClient>,
    csv: &str,
) -> (Vec<ImportEvent>, listomania_server::ImportReport) {
    let lines = parse_delimited(csv);
    let engine = ImportEngine::new(harness.store.clone(), catalog);
    let (tx, mut rx) = mpsc::channel::<ImportEvent>(64);

    let report = engine.run(&harness.list_id, lines, &tx).await;
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (events, report)
}

fn progress_count(events: &[ImportEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ImportEvent::Progress { .. }))
        .count()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn import_resolves_reused_fetched_and_placeholder_rows() {
    let harness = make_harness();

    // "111" is already known to the store from an earlier import.
    harness
        .store
        .upsert_album(listomania_server::list_store::NewAlbum {
            discogs_id: "111".to_string(),
            discogs_kind: Some(RecordKind::Master),
            discogs_artist_id: None,
            title: "The Wall".to_string(),
            artist: "Pink Floyd".to_string(),
            year: Some(1979),
            cover_image: None,
        })
        .unwrap();

    let catalog = Arc::new(
        MockCatalog::default().with_details(details("222", "Radiohead", "OK Computer", 1997)),
    );

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Pink Floyd,The Wall,1979,111\n\
               2,Radiohead,OK Computer,1997,222\n\
               3,Nobody You Know,Obscure Demo Tape,,\n";

    let (events, report) = run_import(&harness, catalog.clone(), csv).await;

    assert_eq!(report.imported.len(), 3);
    assert!(report.errors.is_empty());
    assert_eq!(progress_count(&events), 3);

    let entries = harness.store.list_entries(&harness.list_id).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].album.discogs_id, "111");
    assert_eq!(entries[1].album.discogs_id, "222");
    assert_eq!(entries[1].album.year, Some(1997));
    assert!(entries[2].album.discogs_id.starts_with("unknown-"));

    // The known album was reused, not re-fetched
    assert_eq!(catalog.details_calls.load(Ordering::SeqCst), 1);
    assert!(report.imported[2].contains("(no catalog match)"));
}

#[tokio::test]
async fn reimport_of_same_file_is_a_no_op() {
    let harness = make_harness();

    let catalog = Arc::new(
        MockCatalog::default()
            .with_details(details("222", "Radiohead", "OK Computer", 1997))
            .with_candidate("Portishead", "Dummy", candidate("333", "Portishead", "Dummy"))
            .with_details(details("333", "Portishead", "Dummy", 1994)),
    );

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Radiohead,OK Computer,1997,222\n\
               2,Portishead,Dummy,1994,\n";

    let (_, first) = run_import(&harness, catalog.clone(), csv).await;
    assert_eq!(first.imported.len(), 2);

    let (events, second) = run_import(&harness, catalog.clone(), csv).await;

    // Every row is re-reported as progress but nothing new lands
    assert_eq!(progress_count(&events), 2);
    assert!(second.imported.is_empty());
    assert!(second.errors.is_empty());
    assert_eq!(harness.store.list_entries(&harness.list_id).unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_lines_count_as_errors_but_do_not_abort() {
    let harness = make_harness();
    let catalog = Arc::new(
        MockCatalog::default().with_details(details("222", "Radiohead", "OK Computer", 1997)),
    );

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Radiohead,OK Computer,1997,222\n\
               garbage-line-without-fields\n\
               3,Massive Attack,Mezzanine,,\n";

    let (events, report) = run_import(&harness, catalog, csv).await;

    // One progress event per non-blank data line, invalid ones included
    assert_eq!(progress_count(&events), 3);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("garbage-line-without-fields"));
    assert_eq!(report.imported.len(), 2);
}

#[tokio::test]
async fn throttled_details_fetch_degrades_to_limited_info() {
    let harness = make_harness();
    let catalog = Arc::new(MockCatalog::default().with_throttled_id("555"));

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Aphex Twin,Drukqs,2001,555\n";

    let (_, report) = run_import(&harness, catalog, csv).await;

    assert!(report.errors.is_empty());
    assert_eq!(report.imported.len(), 1);
    assert!(report.imported[0].contains("(limited info)"));

    let entries = harness.store.list_entries(&harness.list_id).unwrap();
    assert_eq!(entries.len(), 1);
    // Row fields still made it into the record
    assert_eq!(entries[0].album.discogs_id, "555");
    assert_eq!(entries[0].album.title, "Drukqs");
    assert_eq!(entries[0].album.year, Some(2001));
}

#[tokio::test]
async fn throttled_search_degrades_to_placeholder() {
    let harness = make_harness();
    let catalog = Arc::new(MockCatalog::default().with_throttled_search("Burial", "Untrue"));

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Burial,Untrue,2007,\n";

    let (_, report) = run_import(&harness, catalog, csv).await;

    // An unreachable catalog never fails the row; it just loses the match
    assert!(report.errors.is_empty());
    assert_eq!(report.imported.len(), 1);
    assert!(report.imported[0].contains("(no catalog match)"));

    let entries = harness.store.list_entries(&harness.list_id).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].album.discogs_id.starts_with("unknown-"));
    assert_eq!(entries[0].album.title, "Untrue");
}

#[tokio::test]
async fn search_match_is_fetched_and_scored() {
    let harness = make_harness();
    let catalog = Arc::new(
        MockCatalog::default()
            .with_candidate(
                "Pink Floyd",
                "The Wall",
                candidate("999", "Pink Floyd (2)", "Another Wall"),
            )
            .with_candidate(
                "Pink Floyd",
                "The Wall",
                candidate("111", "Pink Floyd", "The Wall"),
            )
            .with_details(details("111", "Pink Floyd", "The Wall", 1979)),
    );

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Pink Floyd,The Wall,,\n";

    let (_, report) = run_import(&harness, catalog, csv).await;

    assert_eq!(report.imported.len(), 1);
    let entries = harness.store.list_entries(&harness.list_id).unwrap();
    // The exact match outranks the partial one
    assert_eq!(entries[0].album.discogs_id, "111");
    assert_eq!(entries[0].album.discogs_artist_id.as_deref(), Some("42"));
}

#[test]
fn export_full_shape_parses_back() {
    // Mirrors the export-full response body shape
    let exported = serde_json::json!({
        "version": 1,
        "list": {
            "title": "Best of 1979",
            "description": null,
            "period": "1979",
            "sourceUrl": "https://example.com/best-of-1979",
            "isPublic": true,
        },
        "albums": [
            {
                "rank": 1,
                "artist": "Pink Floyd",
                "title": "The Wall",
                "year": 1979,
                "discogsId": "111",
                "discogsArtistId": "42",
                "coverImage": null,
            },
            {
                "rank": 2,
                "artist": "Nobody You Know",
                "title": "Obscure Demo Tape",
                "year": null,
                "discogsId": "unknown-17000-ab12cd34e",
                "discogsArtistId": null,
                "coverImage": null,
            },
        ],
    })
    .to_string();

    let payload = listomania_server::import::parse_json(&exported).unwrap();
    assert_eq!(payload.list.title.as_deref(), Some("Best of 1979"));
    assert!(payload.list.is_public);
    assert_eq!(payload.lines.len(), 2);

    match &payload.lines[0] {
        listomania_server::import::ParsedLine::Row(row) => {
            assert_eq!(row.rank, Some(1));
            assert_eq!(row.external_id.as_deref(), Some("111"));
            assert_eq!(row.catalog_artist_id.as_deref(), Some("42"));
        }
        other => panic!("expected row, got {:?}", other),
    }

    // A placeholder id from an earlier export must not be matched by id
    match &payload.lines[1] {
        listomania_server::import::ParsedLine::Row(row) => {
            assert!(row.external_id.is_none());
            assert_eq!(row.artist, "Nobody You Know");
        }
        other => panic!("expected row, got {:?}", other),
    }
}

#[tokio::test]
async fn done_event_reports_counts() {
    let harness = make_harness();
    let catalog = Arc::new(
        MockCatalog::default().with_details(details("222", "Radiohead", "OK Computer", 1997)),
    );

    let csv = "Rank,Artist,Title,Year,DiscogsId\n\
               1,Radiohead,OK Computer,1997,222\n\
               broken\n";

    let (_, report) = run_import(&harness, catalog, csv).await;
    let done = report.into_done_event(None, None);

    match done {
        ImportEvent::Done {
            success,
            imported,
            errors,
            message,
            ..
        } => {
            assert!(success);
            assert_eq!(imported, 1);
            assert_eq!(errors.len(), 1);
            assert!(message.contains("1 albums imported"));
            assert!(message.contains("1 errors"));
        }
        other => panic!("expected done event, got {:?}", other),
    }
}
