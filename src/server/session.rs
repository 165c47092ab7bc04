use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::debug;

use crate::list_store::{ListStore, UserRecord, UserRole};

use super::state::ServerState;

pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

#[derive(Debug)]
pub struct Session {
    pub user: UserRecord,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role == UserRole::Admin
    }
}

pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Pull the bearer token out of the Authorization header. A bare token
/// without the "Bearer " prefix is accepted too.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the request's user through the store. Used directly by the
/// streaming import handlers, which report auth failures as in-band
/// events rather than status-code rejections.
pub fn authenticate(store: &dyn ListStore, headers: &HeaderMap) -> Option<UserRecord> {
    let token = match extract_token(headers) {
        None => {
            debug!("No session token in headers");
            return None;
        }
        Some(x) => x,
    };

    match store.find_user_by_token(&token) {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            debug!("Session token did not match any user");
            None
        }
        Err(e) => {
            debug!("Failed to look up session token: {}", e);
            None
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&*ctx.store, &parts.headers)
            .map(|user| Session { user })
            .ok_or(SessionExtractionError::AccessDenied)
    }
}
