//! JSON output renderer.
//!
//! Outputs `{"comments": [...], "dropped": [...], "summary": {...}, "stats": {...}}`.

use crate::constants::VERSION;
use crate::orchestrator::ReviewResult;
use crate::output::OutputRenderer;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, result: &ReviewResult) -> String {
        let output = serde_json::json!({
            "version": VERSION,
            "comments": result.comments,
            "dropped": result.dropped,
            "summary": result.summary(),
            "stats": {
                "files_reviewed": result.files_reviewed,
                "files_skipped": result.files_skipped,
                "chunks": result.chunks,
                "failed_chunks": result.failed_chunks,
            },
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}
