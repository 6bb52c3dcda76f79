//! File and directory scanner for direct review mode.
//!
//! When a path is reviewed directly there is no patch; each readable file
//! becomes a changed file carrying its full content.

use std::path::Path;

use ignore::WalkBuilder;

use crate::models::file::{ChangedFile, FileStatus};

use super::DiffError;

/// Scan a file or directory and produce full-content changed files.
pub async fn scan_path(path: &Path) -> Result<Vec<ChangedFile>, DiffError> {
    if !path.exists() {
        return Err(DiffError::PathNotFound(path.display().to_string()));
    }

    let mut files = Vec::new();

    if path.is_file() {
        if let Some(file) = scan_single_file(path).await {
            files.push(file);
        }
    } else if path.is_dir() {
        let walker = WalkBuilder::new(path).hidden(true).git_ignore(true).build();

        for entry in walker.flatten() {
            if entry.file_type().is_none_or(|ft| !ft.is_file()) {
                continue;
            }
            if let Some(file) = scan_single_file(entry.path()).await {
                files.push(file);
            }
        }
    }

    Ok(files)
}

/// Read one file; binary, unreadable and empty files are skipped.
async fn scan_single_file(path: &Path) -> Option<ChangedFile> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };

    if content.is_empty() {
        return None;
    }

    Some(ChangedFile {
        filename: path.display().to_string(),
        status: FileStatus::Added,
        patch: None,
        size: Some(content.len() as u64),
        content: Some(content),
    })
}
