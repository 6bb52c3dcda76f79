//! Diff engine: unified diff parsing, line mapping, and changed-file sources.

pub mod file;
pub mod files;
pub mod git;
pub mod mapper;
pub mod parser;
pub mod scanner;

use std::path::Path;
use thiserror::Error;

use crate::models::{ChangedFile, InputMode, ParsedDiff};

/// Errors from reading diffs and changed files.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("git command failed: {0}")]
    GitError(String),

    #[error("failed to read input: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("invalid changed-files JSON: {0}")]
    FilesJson(#[from] serde_json::Error),

    #[error("path not found: {0}")]
    PathNotFound(String),
}

/// Parse one file's unified diff text.
pub fn parse_diff(text: &str) -> ParsedDiff {
    parser::parse(text)
}

/// Read a unified diff from stdin.
pub async fn read_diff_stdin() -> Result<String, DiffError> {
    use tokio::io::AsyncReadExt;
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(DiffError::FileReadError)?;
    Ok(buf)
}

/// Produce the changed files for the given input mode.
pub async fn get_changed_files(
    input: &InputMode,
    repo_root: &Path,
) -> Result<Vec<ChangedFile>, DiffError> {
    match input {
        InputMode::DiffFile(path) => {
            let content = file::read_diff_file(path).await?;
            Ok(files::split_unified_diff(&content))
        }
        InputMode::Stdin => {
            let content = read_diff_stdin().await?;
            Ok(files::split_unified_diff(&content))
        }
        InputMode::GitBase(base_ref) => {
            let diff_output = git::git_diff(repo_root, base_ref).await?;
            Ok(files::split_unified_diff(&diff_output))
        }
        InputMode::DirectPath(path) => scanner::scan_path(path).await,
        InputMode::FilesJson(path) => file::read_files_json(path).await,
    }
}
