//! Advisory checks for chunk boundaries that split a syntactic construct.
//!
//! These are heuristics. A chunk that fails them is still reviewed; the
//! caller only logs that the reviewer may be missing surrounding context.

use crate::models::chunk::{Chunk, ChunkValidation};

/// Quote characters checked for balance. Single quotes are left out since
/// lifetimes, char literals and apostrophes in prose make them useless.
const QUOTES: [char; 2] = ['"', '`'];

/// Check a chunk for unbalanced braces, quotes and block comments.
pub fn validate_chunk(chunk: &Chunk) -> ChunkValidation {
    let mut issues = Vec::new();
    let text = chunk.content.as_str();

    let opens = text.matches('{').count();
    let closes = text.matches('}').count();
    if opens != closes {
        issues.push(format!("unbalanced braces: {opens} '{{' vs {closes} '}}'"));
    }

    for quote in QUOTES {
        let count = count_unescaped(text, quote);
        if count % 2 != 0 {
            issues.push(format!("unbalanced {quote} quotes ({count})"));
        }
    }

    let comment_opens = text.matches("/*").count();
    let comment_closes = text.matches("*/").count();
    if comment_opens > comment_closes {
        issues.push("unclosed block comment".to_string());
    } else if comment_closes > comment_opens {
        issues.push("block comment closed without opening".to_string());
    }

    ChunkValidation {
        is_valid: issues.is_empty(),
        issues,
    }
}

/// Count occurrences of `quote` not preceded by a backslash escape.
fn count_unescaped(text: &str, quote: char) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == quote {
            count += 1;
        }
    }
    count
}
