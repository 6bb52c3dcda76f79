//! Forgiving parser for review backend output.
//!
//! Backends are asked for a JSON array of comments but often wrap it in a
//! `{"comments": [...]}` object, a markdown fence, or prose. When nothing
//! parses, the raw text is kept as a single general comment instead of
//! failing the chunk.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::comment::ReviewComment;

/// Wrapper keys tried when the response is a JSON object.
const WRAPPER_KEYS: [&str; 3] = ["comments", "findings", "review"];

/// Content inside markdown code fences. The closing fence must start a
/// line so backticks inside JSON strings do not end the match.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").expect("valid fence regex"));

/// Backend output that could not be read as structured comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackText {
    pub text: String,
}

/// Parsed backend output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewResponse {
    /// Structured comments (possibly none).
    Comments(Vec<ReviewComment>),
    /// Free text that did not contain parseable comments.
    Fallback(FallbackText),
}

impl ReviewResponse {
    /// Flatten into comments; fallback text becomes one general comment.
    pub fn into_comments(self) -> Vec<ReviewComment> {
        match self {
            ReviewResponse::Comments(comments) => comments,
            ReviewResponse::Fallback(fallback) => vec![ReviewComment::general(fallback.text)],
        }
    }
}

/// Parse backend output into comments or a fallback.
pub fn parse_review_response(response: &str) -> ReviewResponse {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return ReviewResponse::Comments(Vec::new());
    }

    for candidate in extract_json_candidates(trimmed) {
        if let Ok(comments) = serde_json::from_str::<Vec<ReviewComment>>(&candidate) {
            return ReviewResponse::Comments(comments);
        }

        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&candidate) {
            for key in WRAPPER_KEYS {
                if let Some(inner) = map.get(key) {
                    if let Ok(comments) = serde_json::from_value::<Vec<ReviewComment>>(inner.clone()) {
                        return ReviewResponse::Comments(comments);
                    }
                }
            }
        }
    }

    tracing::debug!(len = trimmed.len(), "review response is not JSON; keeping as text");
    ReviewResponse::Fallback(FallbackText {
        text: trimmed.to_string(),
    })
}

/// Candidate JSON strings: the raw text, the outermost `[...]` slice, and
/// the contents of any markdown fences.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = vec![text.to_string()];

    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            candidates.push(text[start..=end].to_string());
        }
    }

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            let inner = inner.as_str().trim();
            if !inner.is_empty() {
                candidates.push(inner.to_string());
            }
        }
    }

    candidates
}
