mod admin_routes;
mod import_routes;
mod list_routes;
mod search_routes;
mod session;
mod state;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::CatalogClient;
use crate::list_store::ListStore;

pub use session::Session;
pub use state::ServerState;

const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

pub fn make_app(store: Arc<dyn ListStore>, catalog: Arc<dyn CatalogClient>) -> Router {
    let state = ServerState { store, catalog };

    Router::new()
        .route("/api/lists/{id}/import", post(import_routes::import_into_list))
        .route("/api/lists/import-full", post(import_routes::import_full))
        .route("/api/lists/{id}/export", get(list_routes::export_csv))
        .route("/api/lists/{id}/export-full", get(list_routes::export_full))
        .route("/api/search", get(search_routes::search_catalog))
        .route(
            "/api/admin/albums/{id}/catalog",
            put(admin_routes::correct_album_catalog),
        )
        .route(
            "/api/admin/albums/preview",
            post(admin_routes::preview_album_catalog),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(
    store: Arc<dyn ListStore>,
    catalog: Arc<dyn CatalogClient>,
    port: u16,
) -> Result<()> {
    let app = make_app(store, catalog);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
