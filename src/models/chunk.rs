//! Chunk types handed to the review capability.

use serde::{Deserialize, Serialize};

/// Default chunk budget in bytes.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 50_000;

/// Default overlap budget in bytes.
pub const DEFAULT_OVERLAP: usize = 1_000;

/// One unit of reviewable text.
///
/// `start_line`/`end_line` are 1-based, inclusive, and relative to the
/// flattened source the chunker was given. Consecutive chunks may share
/// lines in their overlap region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl Chunk {
    /// Number of lines the chunk spans.
    pub fn line_span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Whether an absolute line falls inside this chunk.
    pub fn contains_line(&self, line: u32) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// Size limits for [`crate::chunker::chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkOptions {
    /// Maximum chunk size in bytes.
    pub max_chunk_size: usize,
    /// Bytes of trailing context carried into the next chunk.
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Advisory result of checking a chunk for split syntactic constructs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}
