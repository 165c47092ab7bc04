//! Free-text catalog search proxy.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::catalog::CatalogError;

use super::session::Session;
use super::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search_catalog(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    if query.q.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state.catalog.search_by_text(&query.q).await {
        Ok(results) => Json(results).into_response(),
        Err(CatalogError::RateLimitExceeded(_)) => StatusCode::TOO_MANY_REQUESTS.into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}
