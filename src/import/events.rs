//! Progress events streamed to the import caller.
//!
//! Events are serialized one per line (NDJSON) over a long-lived
//! response body. Clients distinguish them by shape: progress updates
//! carry `current`/`total`, the terminal summary carries `success`, and
//! a top-level rejection carries `error`/`status`.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ImportEvent {
    /// Emitted after each processed line.
    Progress {
        current: usize,
        total: usize,
        message: String,
    },

    /// Terminal summary; always the last event of a successful run.
    Done {
        success: bool,
        imported: usize,
        errors: Vec<String>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        list_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        list_title: Option<String>,
    },

    /// Terminal rejection; no rows were processed and no further
    /// events follow.
    Fatal { error: String, status: u16 },
}

impl ImportEvent {
    pub fn progress(current: usize, total: usize, message: impl Into<String>) -> Self {
        ImportEvent::Progress {
            current,
            total,
            message: message.into(),
        }
    }

    pub fn fatal(error: impl Into<String>, status: u16) -> Self {
        ImportEvent::Fatal {
            error: error.into(),
            status,
        }
    }

    /// Serialize as one newline-terminated NDJSON line.
    pub fn to_ndjson_line(&self) -> String {
        // The event shapes above always serialize
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        line
    }
}

/// Accumulated outcome of one import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Descriptions of successfully imported rows, in input order.
    pub imported: Vec<String>,
    /// Per-row error messages, in input order.
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Build the terminal event for this report.
    pub fn into_done_event(self, list_id: Option<String>, list_title: Option<String>) -> ImportEvent {
        let message = if self.errors.is_empty() {
            format!("{} albums imported", self.imported.len())
        } else {
            format!(
                "{} albums imported, {} errors",
                self.imported.len(),
                self.errors.len()
            )
        };
        ImportEvent::Done {
            success: true,
            imported: self.imported.len(),
            errors: self.errors,
            message,
            list_id,
            list_title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_shape() {
        let line = ImportEvent::progress(2, 10, "Pink Floyd - The Wall").to_ndjson_line();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["current"], 2);
        assert_eq!(value["total"], 10);
        assert_eq!(value["message"], "Pink Floyd - The Wall");
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_done_event_message_without_errors() {
        let report = ImportReport {
            imported: vec!["a".into(), "b".into()],
            errors: vec![],
        };
        let line = report.into_done_event(None, None).to_ndjson_line();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["imported"], 2);
        assert_eq!(value["message"], "2 albums imported");
        assert!(value.get("list_id").is_none());
    }

    #[test]
    fn test_done_event_message_with_errors() {
        let report = ImportReport {
            imported: vec!["a".into()],
            errors: vec!["Error: x - y".into()],
        };
        let event = report.into_done_event(Some("l1".into()), Some("My List".into()));
        let value: serde_json::Value = serde_json::from_str(event.to_ndjson_line().trim()).unwrap();
        assert_eq!(value["message"], "1 albums imported, 1 errors");
        assert_eq!(value["errors"][0], "Error: x - y");
        assert_eq!(value["list_id"], "l1");
        assert_eq!(value["list_title"], "My List");
    }

    #[test]
    fn test_fatal_event_shape() {
        let value: serde_json::Value =
            serde_json::from_str(ImportEvent::fatal("Not authorized", 401).to_ndjson_line().trim())
                .unwrap();
        assert_eq!(value["error"], "Not authorized");
        assert_eq!(value["status"], 401);
    }
}
