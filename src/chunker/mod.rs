//! Content chunker.
//!
//! Splits raw file text or diff-derived reviewable text into size-bounded
//! chunks that remember which lines they cover, so comment line numbers
//! reported against a chunk can be projected back onto the whole text.
//! Consecutive chunks share a tail of overlap lines so a reviewer does not
//! lose sight of an enclosing block at a boundary.

pub mod syntax;

pub use syntax::validate_chunk;

use crate::models::chunk::{Chunk, ChunkOptions};
use crate::models::comment::ReviewComment;

/// Number of lines in `content`, as the chunker counts them.
pub fn line_count(content: &str) -> usize {
    content.lines().count()
}

/// Split `content` into chunks of at most `max_chunk_size` bytes.
///
/// A single line longer than the budget becomes a chunk on its own.
/// Every returned chunk carries the final `total_chunks`.
pub fn chunk(content: &str, options: ChunkOptions) -> Vec<Chunk> {
    let lines: Vec<&str> = content.lines().collect();

    if content.len() <= options.max_chunk_size {
        return vec![Chunk {
            content: content.to_string(),
            start_line: 1,
            end_line: to_line(lines.len().max(1)),
            chunk_index: 0,
            total_chunks: 1,
        }];
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    // 0-based index of the first line in the open chunk
    let mut start = 0usize;
    let mut size = 0usize;

    for (i, line) in lines.iter().enumerate() {
        let line_size = line.len() + 1;
        if size + line_size > options.max_chunk_size && i > start {
            chunks.push(make_chunk(&lines, start, i, chunks.len()));

            let overlap_lines = overlap_line_count(&lines[start..i], options.overlap);
            start = i - overlap_lines;
            size = lines[start..i].iter().map(|l| l.len() + 1).sum();

            // Give up overlap lines until the incoming line fits.
            while start < i && size + line_size > options.max_chunk_size {
                size -= lines[start].len() + 1;
                start += 1;
            }
        }
        size += line_size;
    }

    if start < lines.len() {
        chunks.push(make_chunk(&lines, start, lines.len(), chunks.len()));
    }

    let total = chunks.len();
    for c in &mut chunks {
        c.total_chunks = total;
    }

    tracing::debug!(
        bytes = content.len(),
        lines = lines.len(),
        chunks = total,
        "split content into chunks"
    );

    chunks
}

/// Build the chunk covering `lines[start..end]` (0-based, end exclusive).
fn make_chunk(lines: &[&str], start: usize, end: usize, chunk_index: usize) -> Chunk {
    Chunk {
        content: lines[start..end].join("\n"),
        start_line: to_line(start + 1),
        end_line: to_line(end),
        chunk_index,
        total_chunks: 0,
    }
}

/// How many trailing lines of a sealed chunk fit in the overlap budget.
///
/// At least one line of the sealed chunk is left out so each chunk starts
/// strictly after the previous one.
fn overlap_line_count(sealed: &[&str], overlap: usize) -> usize {
    let mut used = 0usize;
    let mut count = 0usize;
    for line in sealed.iter().rev() {
        let line_size = line.len() + 1;
        if used + line_size > overlap {
            break;
        }
        used += line_size;
        count += 1;
    }
    count.min(sealed.len().saturating_sub(1))
}

fn to_line(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Project chunk-local comment lines onto the text the chunk came from.
///
/// The absolute line is `chunk.start_line + line - 1`, clamped into
/// `1..=total_original_lines`. Comments without a line pass through.
pub fn adjust_comment_line_numbers(
    comments: &[ReviewComment],
    chunk: &Chunk,
    total_original_lines: u32,
) -> Vec<ReviewComment> {
    let upper = i64::from(total_original_lines.max(1));
    comments
        .iter()
        .map(|comment| {
            let mut adjusted = comment.clone();
            if let Some(local) = comment.line_number {
                let absolute = i64::from(chunk.start_line).saturating_add(local.saturating_sub(1));
                adjusted.line_number = Some(absolute.clamp(1, upper));
            }
            adjusted
        })
        .collect()
}
