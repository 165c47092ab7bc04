//! Admin catalog-correction routes.
//!
//! Lets an admin re-point an album at an explicit catalog record when
//! the import reconciliation picked the wrong one (or a placeholder).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::catalog::{CatalogAlbum, CatalogError, RecordKind};
use crate::list_store::AlbumMetadataUpdate;

use super::session::Session;
use super::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct CatalogCorrectionBody {
    #[serde(rename = "discogsId")]
    pub discogs_id: String,
    pub kind: Option<RecordKind>,
}

pub async fn correct_album_catalog(
    session: Session,
    State(state): State<ServerState>,
    Path(album_id): Path<String>,
    Json(body): Json<CatalogCorrectionBody>,
) -> Response {
    if !session.is_admin() {
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.store.get_album(&album_id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Failed to load album {}: {:#}", album_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let details = match state.catalog.fetch_details(&body.discogs_id, body.kind).await {
        Ok(details) => details,
        Err(e) => return catalog_error_response(e),
    };

    let update = metadata_update(&details);
    match state.store.update_album_metadata(&album_id, update) {
        Ok(album) => {
            info!(
                "Album {} re-pointed to catalog record {}",
                album_id, details.id
            );
            Json(json!({
                "success": true,
                "album": album,
                "message": format!("Album metadata updated from catalog record {}", details.id),
            }))
            .into_response()
        }
        Err(e) => {
            warn!("Failed to update album {}: {:#}", album_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Fetch the catalog record without touching the store.
pub async fn preview_album_catalog(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<CatalogCorrectionBody>,
) -> Response {
    if !session.is_admin() {
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.catalog.fetch_details(&body.discogs_id, body.kind).await {
        Ok(details) => Json(json!({ "success": true, "album": details })).into_response(),
        Err(e) => catalog_error_response(e),
    }
}

fn metadata_update(details: &CatalogAlbum) -> AlbumMetadataUpdate {
    AlbumMetadataUpdate {
        discogs_id: details.id.clone(),
        discogs_kind: Some(details.kind),
        discogs_artist_id: details.catalog_artist_id.clone(),
        title: details.title.clone(),
        artist: details.artist.clone(),
        year: details.year,
        cover_image: details.cover_image.clone(),
    }
}

fn catalog_error_response(error: CatalogError) -> Response {
    let status = match &error {
        CatalogError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Unavailable(_) | CatalogError::Parse(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "success": false, "error": error.to_string() }))).into_response()
}
