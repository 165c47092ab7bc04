//! External album catalog (Discogs) integration.
//!
//! The client enforces a shared minimum spacing between requests and
//! retries throttling responses with capped exponential backoff. All
//! response parsing happens here; the rest of the crate only sees
//! `CandidateRecord` and `CatalogAlbum`.

mod client;
mod models;
pub mod text;
mod throttle;

pub use client::{CatalogClient, CatalogError, DiscogsClient};
pub use models::{CandidateRecord, CatalogAlbum, RecordKind};
pub use throttle::{BackoffPolicy, RequestThrottle, ThrottleConfig};
