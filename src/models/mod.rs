//! Shared types used across all modules.
//!
//! Diffs, chunks, comments and changed files live here so the parser,
//! chunker, mapper and orchestrator never reach into each other's internals.

pub mod chunk;
pub mod comment;
pub mod diff;
pub mod file;

pub use chunk::{Chunk, ChunkOptions, ChunkValidation};
pub use comment::{
    CommentKind, DropReason, DroppedComment, PostableComment, ReviewComment, Severity, Summary,
};
pub use diff::{DiffEntry, DiffHunk, EntryKind, LineRange, LineTarget, ParsedDiff};
pub use file::{ChangedFile, ContentSource, FileStatus};

use std::path::PathBuf;

/// Where the changed files for a review come from.
#[derive(Debug, Clone)]
pub enum InputMode {
    /// Read a pre-computed unified diff from a file.
    DiffFile(PathBuf),
    /// Read a unified diff from stdin.
    Stdin,
    /// Diff against a git branch or commit.
    GitBase(String),
    /// Review files directly, using their full content.
    DirectPath(PathBuf),
    /// Read a JSON array of changed files, as fetched from a hosting platform.
    FilesJson(PathBuf),
}
