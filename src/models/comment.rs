//! Review comment types: raw AI comments, postable comments, and drop reasons.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::diff::LineTarget;

/// Severity level of a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational suggestion.
    Info,
    /// Potential issue that should be addressed.
    #[default]
    Warning,
    /// Critical issue that must be fixed.
    Error,
}

/// Accepts the loose severity vocabulary models tend to produce
/// ("critical", "minor", "high", ...) and folds it onto three levels.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match s.trim().to_lowercase().as_str() {
            "info" | "note" | "suggestion" | "low" | "minor" | "trivial" | "style" | "nit" => {
                Severity::Info
            }
            "error" | "critical" | "high" | "severe" | "blocker" | "fatal" => Severity::Error,
            _ => Severity::Warning,
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Whether a comment targets a line or the file as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Inline,
    #[default]
    General,
}

/// A candidate comment returned by the AI capability for one chunk.
///
/// `line_number` is chunk-local until the orchestrator re-projects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    #[serde(rename = "type", default)]
    pub kind: CommentKind,
    #[serde(alias = "message", alias = "comment", alias = "body", default)]
    pub content: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(
        alias = "line",
        default,
        deserialize_with = "deserialize_line_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<i64>,
}

impl ReviewComment {
    /// A general (file-level) comment with no line.
    pub fn general(content: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::General,
            content: content.into(),
            severity: Severity::Info,
            suggestion: None,
            line_number: None,
        }
    }

    /// An inline comment at a chunk-local line.
    pub fn inline(line_number: i64, content: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Inline,
            content: content.into(),
            severity: Severity::Warning,
            suggestion: None,
            line_number: Some(line_number),
        }
    }
}

/// Line numbers arrive as integers, numeric strings, floats, or null.
/// Anything unusable becomes `None` rather than failing the whole comment.
fn deserialize_line_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// A comment ready for the hosting platform: absolute line, file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostableComment {
    /// File path relative to the repo root.
    pub path: String,
    /// Absolute line on `side`, or `None` for a file-level comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub side: LineTarget,
    pub kind: CommentKind,
    pub severity: Severity,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Why a comment was discarded during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// The model reported zero or a negative line.
    NonPositiveLine { line: i64 },
    /// The absolute line is far past anything the file could contain.
    Implausible { line: i64, limit: u32 },
    /// The line does not land on a diff entry with a number on the target side.
    Unmappable { line: u32 },
    /// The mapped line is outside the parsed diff's reach.
    OutOfBounds { line: u32, max: u32 },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NonPositiveLine { line } => write!(f, "non-positive line {line}"),
            DropReason::Implausible { line, limit } => {
                write!(f, "line {line} exceeds plausible limit {limit}")
            }
            DropReason::Unmappable { line } => write!(f, "line {line} has no source mapping"),
            DropReason::OutOfBounds { line, max } => {
                write!(f, "line {line} is outside 1..={max}")
            }
        }
    }
}

/// A comment that failed reconciliation, kept so a caller can repost it
/// as a general comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedComment {
    pub comment: ReviewComment,
    pub reason: DropReason,
}

impl DroppedComment {
    /// Demote to a file-level comment, keeping the text.
    pub fn into_general(self, path: &str, side: LineTarget) -> PostableComment {
        PostableComment {
            path: path.to_string(),
            line: None,
            side,
            kind: CommentKind::General,
            severity: self.comment.severity,
            content: self.comment.content,
            suggestion: self.comment.suggestion,
        }
    }
}

/// Summary statistics for a list of postable comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub inline: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl Summary {
    pub fn from_comments(comments: &[PostableComment]) -> Self {
        let mut s = Summary::default();
        for c in comments {
            s.total += 1;
            if c.line.is_some() {
                s.inline += 1;
            }
            match c.severity {
                Severity::Error => s.errors += 1,
                Severity::Warning => s.warnings += 1,
                Severity::Info => s.info += 1,
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn severity_accepts_model_vocabulary() {
        let parse = |s: &str| serde_json::from_str::<Severity>(&format!("\"{s}\"")).unwrap();
        assert_eq!(parse("Critical"), Severity::Error);
        assert_eq!(parse("minor"), Severity::Info);
        assert_eq!(parse("medium"), Severity::Warning);
        assert_eq!(parse("whatever"), Severity::Warning);
        assert_eq!(serde_json::from_str::<Severity>("null").unwrap(), Severity::Warning);
    }

    #[test]
    fn severity_from_str_is_strict() {
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn review_comment_deserializes_loose_shapes() {
        let json = r#"[
            {"type": "inline", "content": "a", "severity": "high", "line_number": 3},
            {"message": "b", "line": "7"},
            {"comment": "c", "line_number": null},
            {"body": "d", "line_number": 4.0},
            {"content": "e", "line_number": "seven"}
        ]"#;
        let comments: Vec<ReviewComment> = serde_json::from_str(json).unwrap();
        assert_eq!(comments[0].kind, CommentKind::Inline);
        assert_eq!(comments[0].severity, Severity::Error);
        assert_eq!(comments[0].line_number, Some(3));
        assert_eq!(comments[1].content, "b");
        assert_eq!(comments[1].line_number, Some(7));
        assert_eq!(comments[2].line_number, None);
        assert_eq!(comments[3].line_number, Some(4));
        assert_eq!(comments[4].line_number, None);
    }

    #[test]
    fn dropped_comment_demotes_to_general() {
        let dropped = DroppedComment {
            comment: ReviewComment::inline(999, "Off the end"),
            reason: DropReason::Implausible { line: 999, limit: 100 },
        };
        let general = dropped.into_general("src/lib.rs", LineTarget::Original);
        assert_eq!(general.line, None);
        assert_eq!(general.kind, CommentKind::General);
        assert_eq!(general.content, "Off the end");
        assert_eq!(general.path, "src/lib.rs");
    }

    #[test]
    fn drop_reason_display() {
        assert_eq!(
            DropReason::OutOfBounds { line: 12, max: 10 }.to_string(),
            "line 12 is outside 1..=10"
        );
        assert_eq!(
            DropReason::NonPositiveLine { line: -1 }.to_string(),
            "non-positive line -1"
        );
    }

    #[test]
    fn summary_counts() {
        let comments = vec![
            PostableComment {
                path: "a.rs".into(),
                line: Some(1),
                side: LineTarget::Original,
                kind: CommentKind::Inline,
                severity: Severity::Error,
                content: "x".into(),
                suggestion: None,
            },
            PostableComment {
                path: "a.rs".into(),
                line: None,
                side: LineTarget::Original,
                kind: CommentKind::General,
                severity: Severity::Info,
                content: "y".into(),
                suggestion: None,
            },
        ];
        let s = Summary::from_comments(&comments);
        assert_eq!(s.total, 2);
        assert_eq!(s.inline, 1);
        assert_eq!(s.errors, 1);
        assert_eq!(s.info, 1);
    }
}
