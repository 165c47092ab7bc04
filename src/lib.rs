//! ListOmania Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod import;
pub mod list_store;
pub mod matching;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog::{CatalogClient, CatalogError, DiscogsClient, ThrottleConfig};
pub use import::{ImportEngine, ImportEvent, ImportReport};
pub use list_store::{ListStore, SqliteListStore, UserRole};
pub use server::{make_app, run_server};
