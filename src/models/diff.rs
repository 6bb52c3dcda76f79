//! Diff-related types: parsed diffs, hunks, and hunk entries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    /// Line exists only in the modified version.
    Added,
    /// Line exists only in the original version.
    Removed,
    /// Line is unchanged.
    Context,
    /// Anything else inside a hunk, e.g. `\ No newline at end of file`.
    Other,
}

impl EntryKind {
    /// The unified-diff prefix for this kind, if it has one.
    pub fn prefix(self) -> Option<char> {
        match self {
            EntryKind::Added => Some('+'),
            EntryKind::Removed => Some('-'),
            EntryKind::Context => Some(' '),
            EntryKind::Other => None,
        }
    }
}

/// A single content line in a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: EntryKind,
    /// Line content with the diff prefix stripped.
    pub content: String,
    /// Line number in the original file (None for added and other lines).
    pub original_line: Option<u32>,
    /// Line number in the modified file (None for removed and other lines).
    pub modified_line: Option<u32>,
}

/// Inclusive line range, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    /// `end < start` when `count` is 0 (the side contributes no lines).
    fn from_start_count(start: u32, count: u32) -> Self {
        Self {
            start,
            end: start.saturating_add(count).saturating_sub(1),
        }
    }
}

/// One `@@ -a,b +c,d @@` block and its entries.
///
/// Derived counts and ranges are computed once in [`DiffHunk::new`]; the
/// hunk is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffHunk {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
    section: Option<String>,
    entries: Vec<DiffEntry>,
    original_range: LineRange,
    modified_range: LineRange,
    added_count: usize,
    removed_count: usize,
    context_count: usize,
}

impl DiffHunk {
    /// Finalize a hunk from its header values and collected entries.
    pub fn new(
        old_start: u32,
        old_count: u32,
        new_start: u32,
        new_count: u32,
        section: Option<String>,
        entries: Vec<DiffEntry>,
    ) -> Self {
        let count = |kind| entries.iter().filter(|e| e.kind == kind).count();
        let added_count = count(EntryKind::Added);
        let removed_count = count(EntryKind::Removed);
        let context_count = count(EntryKind::Context);

        Self {
            old_start,
            old_count,
            new_start,
            new_count,
            section,
            original_range: LineRange::from_start_count(old_start, old_count),
            modified_range: LineRange::from_start_count(new_start, new_count),
            entries,
            added_count,
            removed_count,
            context_count,
        }
    }

    pub fn old_start(&self) -> u32 {
        self.old_start
    }

    pub fn old_count(&self) -> u32 {
        self.old_count
    }

    pub fn new_start(&self) -> u32 {
        self.new_start
    }

    pub fn new_count(&self) -> u32 {
        self.new_count
    }

    /// Text trailing the closing `@@`, usually the enclosing function.
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn original_range(&self) -> LineRange {
        self.original_range
    }

    pub fn modified_range(&self) -> LineRange {
        self.modified_range
    }

    pub fn added_count(&self) -> usize {
        self.added_count
    }

    pub fn removed_count(&self) -> usize {
        self.removed_count
    }

    pub fn context_count(&self) -> usize {
        self.context_count
    }

    /// Whether the hunk adds or removes anything.
    pub fn has_changes(&self) -> bool {
        self.added_count + self.removed_count > 0
    }

    /// Last line of the original file this hunk reaches (0 for pure additions at 0).
    fn original_end(&self) -> u32 {
        self.old_start.saturating_add(self.old_count).saturating_sub(1)
    }

    fn modified_end(&self) -> u32 {
        self.new_start.saturating_add(self.new_count).saturating_sub(1)
    }
}

/// Result of parsing one file's diff text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDiff {
    hunks: Vec<DiffHunk>,
    has_content: bool,
    original_line_count: u32,
    modified_line_count: u32,
}

impl ParsedDiff {
    /// An empty parse result (`has_content == false`).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a parsed diff, computing the line counts from the hunk headers.
    pub fn from_hunks(hunks: Vec<DiffHunk>) -> Self {
        let original_line_count = hunks.iter().map(DiffHunk::original_end).max().unwrap_or(0);
        let modified_line_count = hunks.iter().map(DiffHunk::modified_end).max().unwrap_or(0);
        Self {
            has_content: !hunks.is_empty(),
            hunks,
            original_line_count,
            modified_line_count,
        }
    }

    pub fn hunks(&self) -> &[DiffHunk] {
        &self.hunks
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    /// Highest original-file line reachable from any hunk header.
    pub fn original_line_count(&self) -> u32 {
        self.original_line_count
    }

    /// Highest modified-file line reachable from any hunk header.
    pub fn modified_line_count(&self) -> u32 {
        self.modified_line_count
    }

    /// Total added lines across all hunks.
    pub fn added_lines(&self) -> usize {
        self.hunks.iter().map(DiffHunk::added_count).sum()
    }

    /// Total removed lines across all hunks.
    pub fn removed_lines(&self) -> usize {
        self.hunks.iter().map(DiffHunk::removed_count).sum()
    }
}

/// Which side of a diff a line number refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LineTarget {
    /// Pre-change file.
    #[default]
    Original,
    /// Post-change file.
    Modified,
}

impl LineTarget {
    /// Pick this side's line number from an entry.
    pub fn line_of(self, entry: &DiffEntry) -> Option<u32> {
        match self {
            LineTarget::Original => entry.original_line,
            LineTarget::Modified => entry.modified_line,
        }
    }

    /// This side's line count for a parsed diff.
    pub fn line_count(self, parsed: &ParsedDiff) -> u32 {
        match self {
            LineTarget::Original => parsed.original_line_count(),
            LineTarget::Modified => parsed.modified_line_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryKind, old: Option<u32>, new: Option<u32>) -> DiffEntry {
        DiffEntry {
            kind,
            content: String::new(),
            original_line: old,
            modified_line: new,
        }
    }

    #[test]
    fn hunk_derives_counts_and_ranges() {
        let hunk = DiffHunk::new(
            5,
            3,
            5,
            4,
            None,
            vec![
                entry(EntryKind::Removed, Some(5), None),
                entry(EntryKind::Added, None, Some(5)),
                entry(EntryKind::Added, None, Some(6)),
                entry(EntryKind::Context, Some(6), Some(7)),
                entry(EntryKind::Other, None, None),
            ],
        );
        assert_eq!(hunk.added_count(), 2);
        assert_eq!(hunk.removed_count(), 1);
        assert_eq!(hunk.context_count(), 1);
        assert!(hunk.has_changes());
        assert_eq!(hunk.original_range(), LineRange { start: 5, end: 7 });
        assert_eq!(hunk.modified_range(), LineRange { start: 5, end: 8 });
    }

    #[test]
    fn context_only_hunk_has_no_changes() {
        let hunk = DiffHunk::new(1, 1, 1, 1, None, vec![entry(EntryKind::Context, Some(1), Some(1))]);
        assert!(!hunk.has_changes());
    }

    #[test]
    fn new_file_hunk_original_range_is_empty() {
        let hunk = DiffHunk::new(0, 0, 1, 2, None, Vec::new());
        assert_eq!(hunk.original_range(), LineRange { start: 0, end: 0 });
        assert_eq!(hunk.modified_range(), LineRange { start: 1, end: 2 });
    }

    #[test]
    fn parsed_diff_counts_take_the_max_over_hunks() {
        let parsed = ParsedDiff::from_hunks(vec![
            DiffHunk::new(10, 2, 10, 3, None, Vec::new()),
            DiffHunk::new(20, 4, 21, 1, None, Vec::new()),
        ]);
        assert!(parsed.has_content());
        assert_eq!(parsed.original_line_count(), 23);
        assert_eq!(parsed.modified_line_count(), 21);
    }

    #[test]
    fn empty_parsed_diff() {
        let parsed = ParsedDiff::empty();
        assert!(!parsed.has_content());
        assert!(parsed.hunks().is_empty());
        assert_eq!(parsed.original_line_count(), 0);
        assert_eq!(parsed.modified_line_count(), 0);
    }

    #[test]
    fn line_target_parses_case_insensitively() {
        assert_eq!("Original".parse::<LineTarget>().unwrap(), LineTarget::Original);
        assert_eq!("modified".parse::<LineTarget>().unwrap(), LineTarget::Modified);
        assert_eq!(LineTarget::Modified.to_string(), "modified");
    }
}
