//! Output renderers: terminal and JSON.

pub mod json;
pub mod terminal;

use crate::orchestrator::ReviewResult;

/// Trait for rendering a review run to an output format.
pub trait OutputRenderer {
    /// Render the result to a string.
    fn render(&self, result: &ReviewResult) -> String;
}
