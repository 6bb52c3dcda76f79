//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use std::path::Path;

use anyhow::{Context, Result};

/// Read text from a file, or from stdin when `path` is `None` or `-`.
pub async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("failed to read {}", p.display())),
        _ => patchline::diff::read_diff_stdin()
            .await
            .context("failed to read stdin"),
    }
}
