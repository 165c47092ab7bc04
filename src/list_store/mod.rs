//! Relational store for users, lists, canonical albums and list
//! membership.

mod models;
mod schema;
mod sqlite_store;
mod trait_def;

pub use models::{
    AlbumMetadataUpdate, AlbumRecord, ListEntry, ListRecord, NewAlbum, NewList, UserRecord,
    UserRole,
};
pub use sqlite_store::SqliteListStore;
pub use trait_def::ListStore;
