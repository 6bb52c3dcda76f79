//! Line mapping between reviewable text and the files a diff describes.
//!
//! Two addressing schemes exist. [`map_to_original`] / [`map_to_modified`]
//! treat a local line as an index into a single hunk's entry list. The
//! text actually shown to a reviewer is usually several hunks flattened
//! together, possibly without context lines, so [`extract_reviewable`]
//! also records where each emitted line came from. [`ReviewableText::resolve`]
//! uses that table to turn a line of the flattened text into a file line
//! without guessing which hunk it belongs to.

use serde::Serialize;

use crate::models::diff::{DiffEntry, LineTarget, ParsedDiff};

/// Default cap on emitted reviewable lines.
pub const DEFAULT_MAX_REVIEWABLE_LINES: usize = 1000;

/// Options for [`extract_reviewable_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Emit unchanged lines as well as additions and removals.
    pub include_context: bool,
    /// Hard cap on lines emitted across all hunks.
    pub max_lines: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_context: true,
            max_lines: DEFAULT_MAX_REVIEWABLE_LINES,
        }
    }
}

/// Resolve a hunk-relative local line to an original-file line.
///
/// Hunks are searched in order; the first hunk long enough to contain
/// `local_line` whose entry has an original number wins.
pub fn map_to_original(local_line: i64, parsed: &ParsedDiff) -> Option<u32> {
    map_hunk_local(local_line, parsed, LineTarget::Original)
}

/// Mirror of [`map_to_original`] for the modified file.
pub fn map_to_modified(local_line: i64, parsed: &ParsedDiff) -> Option<u32> {
    map_hunk_local(local_line, parsed, LineTarget::Modified)
}

fn map_hunk_local(local_line: i64, parsed: &ParsedDiff, target: LineTarget) -> Option<u32> {
    if parsed.hunks().is_empty() || local_line <= 0 {
        return None;
    }
    let index = usize::try_from(local_line - 1).ok()?;
    parsed
        .hunks()
        .iter()
        .filter_map(|hunk| hunk.entries().get(index))
        .find_map(|entry| target.line_of(entry))
}

/// Whether `line` is a usable line number on `target` for this diff.
pub fn is_valid_line_number(line: Option<i64>, parsed: &ParsedDiff, target: LineTarget) -> bool {
    let Some(line) = line else {
        return false;
    };
    if parsed.hunks().is_empty() || line <= 0 {
        return false;
    }
    line <= i64::from(target.line_count(parsed))
}

/// Position of one reviewable line inside the parsed diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineOrigin {
    pub hunk_index: usize,
    pub entry_index: usize,
}

/// Flattened reviewable text plus the origin of each of its lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewableText {
    pub text: String,
    /// `origins[i]` is the source of line `i + 1` of `text`.
    pub origins: Vec<LineOrigin>,
}

impl ReviewableText {
    /// Number of lines in `text`.
    pub fn line_count(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Where a 1-based line of the flattened text came from.
    pub fn origin(&self, line: u32) -> Option<LineOrigin> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.origins.get(index).copied()
    }

    /// The diff entry behind a 1-based line of the flattened text.
    pub fn entry<'a>(&self, line: u32, parsed: &'a ParsedDiff) -> Option<&'a DiffEntry> {
        let origin = self.origin(line)?;
        parsed
            .hunks()
            .get(origin.hunk_index)?
            .entries()
            .get(origin.entry_index)
    }

    /// Resolve a 1-based line of the flattened text to a file line on `target`.
    ///
    /// Returns `None` when the line is outside the text or the entry has no
    /// number on that side (an added line has no original line).
    pub fn resolve(&self, line: u32, parsed: &ParsedDiff, target: LineTarget) -> Option<u32> {
        self.entry(line, parsed).and_then(|entry| target.line_of(entry))
    }
}

/// Flatten a parsed diff into prefixed review lines, recording each line's origin.
pub fn extract_reviewable(parsed: &ParsedDiff, options: ExtractOptions) -> ReviewableText {
    let mut out = ReviewableText::default();
    let mut lines: Vec<String> = Vec::new();

    'hunks: for (hunk_index, hunk) in parsed.hunks().iter().enumerate() {
        for (entry_index, entry) in hunk.entries().iter().enumerate() {
            if lines.len() >= options.max_lines {
                break 'hunks;
            }
            let Some(prefix) = entry.kind.prefix() else {
                continue;
            };
            if prefix == ' ' && !options.include_context {
                continue;
            }
            lines.push(format!("{prefix}{}", entry.content));
            out.origins.push(LineOrigin {
                hunk_index,
                entry_index,
            });
        }
    }

    out.text = lines.join("\n");
    out
}

/// Flatten a parsed diff into the text shown to the reviewer.
pub fn extract_reviewable_text(parsed: &ParsedDiff, options: ExtractOptions) -> String {
    extract_reviewable(parsed, options).text
}
