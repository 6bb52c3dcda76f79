//! Read diffs and changed-file lists from disk.

use std::path::Path;

use crate::models::ChangedFile;

use super::DiffError;

/// Read a unified diff from a file path.
pub async fn read_diff_file(path: &Path) -> Result<String, DiffError> {
    if !path.exists() {
        return Err(DiffError::PathNotFound(path.display().to_string()));
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(DiffError::FileReadError)
}

/// Read a JSON array of changed files (`filename`, `status`, `patch`, `content`, `size`).
pub async fn read_files_json(path: &Path) -> Result<Vec<ChangedFile>, DiffError> {
    let raw = read_diff_file(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
