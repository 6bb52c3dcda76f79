//! Changed-file input and per-file content resolution.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Change status of a file in a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileStatus {
    Added,
    #[default]
    Modified,
    Removed,
    Renamed,
}

/// A changed file as delivered by the file source.
///
/// At most one of `patch`/`content` is expected to be authoritative;
/// having neither is a valid skip state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Size in bytes as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// What the orchestrator can review for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource<'a> {
    /// Only a unified-diff patch is available.
    Patch(&'a str),
    /// The full file text is available.
    Full(&'a str),
    /// Nothing reviewable.
    None,
}

impl ChangedFile {
    /// Decide which representation to review. A non-empty patch wins over
    /// full content.
    pub fn content_source(&self) -> ContentSource<'_> {
        fn non_blank(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|t| !t.trim().is_empty())
        }

        if let Some(patch) = non_blank(&self.patch) {
            ContentSource::Patch(patch)
        } else if let Some(content) = non_blank(&self.content) {
            ContentSource::Full(content)
        } else {
            ContentSource::None
        }
    }

    /// Language name used in review requests, from the file extension.
    pub fn language(&self) -> &'static str {
        language_for_path(&self.filename)
    }
}

/// Map a path's extension to a language name. Unknown extensions yield `"text"`.
pub fn language_for_path(path: &str) -> &'static str {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "swift" => "swift",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "sh" | "bash" | "zsh" => "bash",
        "html" | "htm" => "html",
        "css" | "scss" => "css",
        "json" => "json",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "sql" => "sql",
        _ => "text",
    }
}
