//! Unified diff parser for a single file's patch.
//!
//! Turns `@@ -a,b +c,d @@` blocks into [`ParsedDiff`] hunks with dual
//! line-number tracks. Never fails: malformed or headerless input simply
//! yields no hunks.

use crate::models::diff::{DiffEntry, DiffHunk, EntryKind, ParsedDiff};

/// Line prefixes that carry file metadata rather than hunk content.
const METADATA_PREFIXES: [&str; 4] = ["---", "+++", "Index:", "diff --git"];

/// Parse one file's unified diff text.
pub fn parse(diff_text: &str) -> ParsedDiff {
    if diff_text.trim().is_empty() {
        return ParsedDiff::empty();
    }

    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut current: Option<HunkBuilder> = None;

    for line in diff_text.lines() {
        if line.is_empty() {
            continue;
        }

        if let Some(header) = parse_hunk_header(line) {
            if let Some(builder) = current.take() {
                hunks.push(builder.finish());
            }
            current = Some(HunkBuilder::new(header));
            continue;
        }

        if METADATA_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        // Content before the first header has nowhere to go.
        if let Some(builder) = current.as_mut() {
            builder.push_line(line);
        }
    }

    if let Some(builder) = current {
        hunks.push(builder.finish());
    }

    ParsedDiff::from_hunks(hunks)
}

/// Values from a `@@ -a,b +c,d @@ section` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HunkHeader {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
    section: Option<String>,
}

/// In-progress hunk with running line counters.
///
/// A counter becomes `None` once it would pass `u32::MAX`; later lines on
/// that side carry no line number.
struct HunkBuilder {
    header: HunkHeader,
    entries: Vec<DiffEntry>,
    old_line: Option<u32>,
    new_line: Option<u32>,
}

fn advance(counter: &mut Option<u32>) {
    *counter = counter.and_then(|n| n.checked_add(1));
}

impl HunkBuilder {
    fn new(header: HunkHeader) -> Self {
        Self {
            old_line: Some(header.old_start),
            new_line: Some(header.new_start),
            header,
            entries: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        let entry = if let Some(content) = line.strip_prefix('+') {
            let entry = DiffEntry {
                kind: EntryKind::Added,
                content: content.to_string(),
                original_line: None,
                modified_line: self.new_line,
            };
            advance(&mut self.new_line);
            entry
        } else if let Some(content) = line.strip_prefix('-') {
            let entry = DiffEntry {
                kind: EntryKind::Removed,
                content: content.to_string(),
                original_line: self.old_line,
                modified_line: None,
            };
            advance(&mut self.old_line);
            entry
        } else if let Some(content) = line.strip_prefix(' ') {
            let entry = DiffEntry {
                kind: EntryKind::Context,
                content: content.to_string(),
                original_line: self.old_line,
                modified_line: self.new_line,
            };
            advance(&mut self.old_line);
            advance(&mut self.new_line);
            entry
        } else {
            // "\ No newline at end of file" and anything unrecognised
            DiffEntry {
                kind: EntryKind::Other,
                content: line.to_string(),
                original_line: None,
                modified_line: None,
            }
        };
        self.entries.push(entry);
    }

    fn finish(self) -> DiffHunk {
        let HunkHeader {
            old_start,
            old_count,
            new_start,
            new_count,
            section,
        } = self.header;
        DiffHunk::new(old_start, old_count, new_start, new_count, section, self.entries)
    }
}

/// Parse a `@@ -old_start,old_count +new_start,new_count @@ section` line.
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let line = line.strip_prefix("@@ ")?;
    let end = line.find(" @@")?;
    let range_part = &line[..end];
    let section = {
        let rest = line[end + 3..].trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    };

    let mut parts = range_part.split(' ');
    let (old_start, old_count) = parse_range(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_count) = parse_range(parts.next()?.strip_prefix('+')?)?;
    if parts.next().is_some() {
        return None;
    }

    Some(HunkHeader {
        old_start,
        old_count,
        new_start,
        new_count,
        section,
    })
}

/// Parse "start,count" or "start" (count defaults to 1).
fn parse_range(s: &str) -> Option<(u32, u32)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}
