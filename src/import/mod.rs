//! Bulk list import: input parsing, reconciliation, progress events.

mod engine;
mod events;
mod parser;

pub use engine::{placeholder_id, ImportEngine};
pub use events::{ImportEvent, ImportReport};
pub use parser::{
    parse_delimited, parse_json, ImportRow, JsonPayload, ListMetadata, ParsedLine, PayloadError,
    PLACEHOLDER_PREFIX,
};
