//! List export routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::import::PLACEHOLDER_PREFIX;
use crate::list_store::{ListEntry, ListRecord};

use super::session::Session;
use super::state::ServerState;

pub async fn export_csv(
    session: Session,
    State(state): State<ServerState>,
    Path(list_id): Path<String>,
) -> Response {
    let (list, entries) = match load_owned_list(&session, &state, &list_id) {
        Ok(x) => x,
        Err(response) => return response,
    };

    let mut csv = String::from("Rank,Artist,Title,Year,DiscogsId\n");
    for entry in &entries {
        let album = &entry.album;
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            entry.position,
            csv_field(&album.artist),
            csv_field(&album.title),
            album.year.map(|y| y.to_string()).unwrap_or_default(),
            exportable_catalog_id(&album.discogs_id),
        ));
    }

    let filename = format!("{}.csv", filename_slug(&list.title));
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/csv; charset=utf-8")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(csv.into())
        .unwrap()
}

/// Full JSON export, shaped so it can be fed straight back into the
/// import-full endpoint.
pub async fn export_full(
    session: Session,
    State(state): State<ServerState>,
    Path(list_id): Path<String>,
) -> Response {
    let (list, entries) = match load_owned_list(&session, &state, &list_id) {
        Ok(x) => x,
        Err(response) => return response,
    };

    let albums: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| {
            let album = &entry.album;
            json!({
                "rank": entry.position,
                "artist": album.artist,
                "title": album.title,
                "year": album.year,
                "discogsId": album.discogs_id,
                "discogsArtistId": album.discogs_artist_id,
                "coverImage": album.cover_image,
            })
        })
        .collect();

    Json(json!({
        "version": 1,
        "list": {
            "title": list.title,
            "description": list.description,
            "period": list.period,
            "sourceUrl": list.source_url,
            "isPublic": list.is_public,
        },
        "albums": albums,
    }))
    .into_response()
}

fn load_owned_list(
    session: &Session,
    state: &ServerState,
    list_id: &str,
) -> Result<(ListRecord, Vec<ListEntry>), Response> {
    let list = match state.store.get_list(list_id) {
        Ok(Some(list)) => list,
        Ok(None) => return Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => {
            warn!("Failed to load list {}: {:#}", list_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    if list.user_id != session.user.id && !session.is_admin() {
        return Err(StatusCode::FORBIDDEN.into_response());
    }

    let entries = match state.store.list_entries(list_id) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to load entries of list {}: {:#}", list_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    Ok((list, entries))
}

/// Quote a CSV field only when it needs it.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Placeholder ids never leave the system as catalog ids.
fn exportable_catalog_id(discogs_id: &str) -> &str {
    if discogs_id.starts_with(PLACEHOLDER_PREFIX) {
        ""
    } else {
        discogs_id
    }
}

fn filename_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "list".to_string()
    } else {
        slug
    }
}
