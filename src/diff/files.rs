//! Split a multi-file `git diff` into per-file changed files.
//!
//! Each file's patch is kept as text in the shape hosting platforms hand
//! out (hunks only, no extended headers) so it flows through the same
//! per-file [`parse`](super::parser::parse) path as a fetched PR file.

use crate::models::file::{ChangedFile, FileStatus};

/// Split unified diff output into one [`ChangedFile`] per `diff --git` block.
///
/// Binary files are returned without a patch, which the orchestrator
/// treats as nothing to review.
pub fn split_unified_diff(input: &str) -> Vec<ChangedFile> {
    let mut files: Vec<ChangedFile> = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if !line.starts_with("diff --git ") {
            continue;
        }

        let (old_path, new_path) = parse_diff_header(line);
        let mut status = FileStatus::Modified;
        let mut is_binary = false;
        let mut patch_lines: Vec<&str> = Vec::new();

        while let Some(&next) = lines.peek() {
            if next.starts_with("diff --git ") {
                break;
            }
            lines.next();

            if !patch_lines.is_empty() {
                patch_lines.push(next);
            } else if next.starts_with("@@") {
                patch_lines.push(next);
            } else if next.starts_with("new file mode") {
                status = FileStatus::Added;
            } else if next.starts_with("deleted file mode") {
                status = FileStatus::Removed;
            } else if next.starts_with("rename from") || next.starts_with("rename to") {
                status = FileStatus::Renamed;
            } else if next.starts_with("Binary files") || next.starts_with("GIT binary patch") {
                is_binary = true;
            }
        }

        let filename = if status == FileStatus::Removed {
            old_path
        } else {
            new_path
        };

        let patch = if is_binary || patch_lines.is_empty() {
            None
        } else {
            Some(patch_lines.join("\n"))
        };

        files.push(ChangedFile {
            filename,
            status,
            size: patch.as_ref().map(|p| p.len() as u64),
            patch,
            content: None,
        });
    }

    files
}

/// Parse the "diff --git a/path b/path" header line.
fn parse_diff_header(line: &str) -> (String, String) {
    let rest = line.strip_prefix("diff --git ").unwrap_or(line);

    // Paths are prefixed with a/ and b/ by default, or c/w/i/o/ when
    // git's diff.mnemonicPrefix is enabled.
    if let Some(b_idx) = find_second_prefix(rest) {
        let old_path = strip_diff_prefix(&rest[..b_idx]).to_string();
        let new_path = strip_diff_prefix(&rest[b_idx + 1..]).to_string();
        (old_path, new_path)
    } else {
        let mut parts = rest.splitn(2, ' ');
        let old_path = strip_diff_prefix(parts.next().unwrap_or("")).to_string();
        let new_path = strip_diff_prefix(parts.next().unwrap_or("")).to_string();
        (old_path, new_path)
    }
}

/// Strip a single-character git diff prefix (`a/`, `b/`, `c/`, `w/`, `i/`, `o/`).
fn strip_diff_prefix(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b'/' && matches!(bytes[0], b'a' | b'b' | b'c' | b'w' | b'i' | b'o') {
        return &path[2..];
    }
    path
}

/// Find the space before the second path prefix (` X/`) in a diff header.
fn find_second_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len().saturating_sub(1)).find(|&i| {
        bytes[i] == b' '
            && bytes.get(i + 2) == Some(&b'/')
            && matches!(bytes.get(i + 1), Some(b'a' | b'b' | b'c' | b'w' | b'i' | b'o'))
    })
}
