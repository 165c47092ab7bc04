//! Streaming bulk-import routes.
//!
//! Both endpoints respond with newline-delimited JSON over a chunked
//! body: one progress event per input line, then a terminal event.
//! Failures that reject the whole operation (auth, missing list, bad
//! payload) are reported as a single in-band fatal event so clients
//! only ever parse one shape.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use tracing::{info, warn};

use crate::import::{parse_delimited, parse_json, ImportEngine, ImportEvent, ParsedLine};
use crate::list_store::NewList;

use super::session::authenticate;
use super::state::ServerState;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
const EVENT_CHANNEL_CAPACITY: usize = 32;

pub async fn import_into_list(
    State(state): State<ServerState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let user = match authenticate(&*state.store, &headers) {
        Some(user) => user,
        None => return fatal_response("Unauthorized", 401),
    };

    let list = match state.store.get_list(&list_id) {
        Ok(Some(list)) => list,
        Ok(None) => return fatal_response("List not found", 404),
        Err(e) => {
            warn!("Failed to load list {}: {:#}", list_id, e);
            return fatal_response("Internal error", 500);
        }
    };

    if list.user_id != user.id && !matches!(user.role, crate::list_store::UserRole::Admin) {
        return fatal_response("Forbidden", 403);
    }

    let text = match read_upload(multipart).await {
        Some(text) => text,
        None => return fatal_response("Missing file upload", 400),
    };

    let lines = parse_delimited(&text);
    if lines.is_empty() {
        return fatal_response("No data rows found", 400);
    }

    info!("Importing {} rows into list {}", lines.len(), list_id);
    stream_import(state, list_id, lines, None)
}

pub async fn import_full(
    State(state): State<ServerState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let user = match authenticate(&*state.store, &headers) {
        Some(user) => user,
        None => return fatal_response("Unauthorized", 401),
    };

    let text = match read_upload(multipart).await {
        Some(text) => text,
        None => return fatal_response("Missing file upload", 400),
    };

    let payload = match parse_json(&text) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejecting import payload: {}", e);
            return fatal_response("Invalid payload", 400);
        }
    };

    let metadata = payload.list;
    let new_list = NewList {
        title: metadata.title.unwrap_or_else(|| "Imported list".to_string()),
        description: metadata.description,
        period: metadata.period,
        source_url: metadata.source_url,
        is_public: metadata.is_public,
        user_id: user.id,
    };

    let list = match state.store.create_list(new_list) {
        Ok(list) => list,
        Err(e) => {
            warn!("Failed to create list: {:#}", e);
            return fatal_response("Internal error", 500);
        }
    };

    info!(
        "Importing {} entries into new list {} ({})",
        payload.lines.len(),
        list.id,
        list.title
    );
    let done_list = Some((list.id.clone(), list.title.clone()));
    stream_import(state, list.id, payload.lines, done_list)
}

/// Read the first multipart field as UTF-8 text.
async fn read_upload(mut multipart: Multipart) -> Option<String> {
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.text().await {
            Ok(text) if !text.trim().is_empty() => return Some(text),
            Ok(_) => continue,
            Err(e) => {
                warn!("Failed to read upload field: {}", e);
                return None;
            }
        }
    }
    None
}

/// Spawn the engine and wire its event channel into a chunked NDJSON
/// response body. The engine stops on its own if the client goes away.
fn stream_import(
    state: ServerState,
    list_id: String,
    lines: Vec<ParsedLine>,
    done_list: Option<(String, String)>,
) -> Response {
    let (tx, rx) = tokio::sync::mpsc::channel::<ImportEvent>(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let engine = ImportEngine::new(state.store.clone(), state.catalog.clone());
        let report = engine.run(&list_id, lines, &tx).await;
        let (done_id, done_title) = match done_list {
            Some((id, title)) => (Some(id), Some(title)),
            None => (None, None),
        };
        let _ = tx.send(report.into_done_event(done_id, done_title)).await;
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<_, std::convert::Infallible>(event.to_ndjson_line()), rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", NDJSON_CONTENT_TYPE)
        .body(Body::from_stream(stream))
        .unwrap()
}

/// One fatal event as the whole body; the stream closes right after.
fn fatal_response(error: &str, status: u16) -> Response {
    let line = ImportEvent::fatal(error, status).to_ndjson_line();
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", NDJSON_CONTENT_TYPE)
        .body(Body::from(line))
        .unwrap()
}
