use std::sync::Arc;

use axum::extract::FromRef;

use crate::catalog::CatalogClient;
use crate::list_store::ListStore;

pub type GuardedListStore = Arc<dyn ListStore>;
pub type GuardedCatalogClient = Arc<dyn CatalogClient>;

#[derive(Clone)]
pub struct ServerState {
    pub store: GuardedListStore,
    pub catalog: GuardedCatalogClient,
}

impl FromRef<ServerState> for GuardedListStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogClient {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}
