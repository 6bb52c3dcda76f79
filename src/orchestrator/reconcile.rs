//! Turning chunk-local review comments into postable comments.
//!
//! Per comment, in order:
//! 1. no line: passes through as a general comment
//! 2. line <= 0: dropped
//! 3. absolute line past twice the plausible line count: dropped
//! 4. absolute line clamped into the reviewed text
//! 5. patch reviews only: resolved through the origin table to a file line
//! 6. final bounds check against the target side
//!
//! Nothing here fails; rejected comments come back in
//! [`Reconciled::dropped`] with a reason.

use serde::Serialize;

use crate::chunker::adjust_comment_line_numbers;
use crate::diff::mapper::{ReviewableText, is_valid_line_number};
use crate::models::chunk::Chunk;
use crate::models::comment::{
    CommentKind, DropReason, DroppedComment, PostableComment, ReviewComment,
};
use crate::models::diff::{LineTarget, ParsedDiff};

/// Rough average line length used to estimate line counts from byte sizes.
pub const ESTIMATED_BYTES_PER_LINE: u64 = 40;

/// How a patch review's lines map back to the file.
#[derive(Debug, Clone, Copy)]
pub struct PatchMapping<'a> {
    pub parsed: &'a ParsedDiff,
    /// The flattened text that was chunked, with per-line origins.
    pub reviewable: &'a ReviewableText,
    pub target: LineTarget,
}

/// Everything reconciliation needs to know about the reviewed file.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// File path copied onto every postable comment.
    pub path: &'a str,
    /// Line count of the text the chunks were cut from.
    pub total_lines: u32,
    /// File size in bytes, when the source reported one.
    pub size_bytes: Option<u64>,
    /// `None` for full-content reviews.
    pub patch: Option<PatchMapping<'a>>,
}

impl ReconcileContext<'_> {
    /// Side postable lines refer to.
    fn side(&self) -> LineTarget {
        self.patch.map(|p| p.target).unwrap_or(LineTarget::Modified)
    }

    /// Upper bound on believable absolute lines.
    ///
    /// Twice the larger of the known line count and an estimate from the
    /// byte size.
    pub fn plausible_limit(&self) -> u32 {
        let known = self
            .patch
            .map(|p| p.target.line_count(p.parsed))
            .unwrap_or(0)
            .max(self.total_lines);
        let estimated = self
            .size_bytes
            .map(|size| u32::try_from(size.div_ceil(ESTIMATED_BYTES_PER_LINE)).unwrap_or(u32::MAX))
            .unwrap_or(0);
        known.max(estimated).max(1).saturating_mul(2)
    }
}

/// Output of [`reconcile_comments`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    pub postable: Vec<PostableComment>,
    pub dropped: Vec<DroppedComment>,
}

impl Reconciled {
    pub fn extend(&mut self, other: Reconciled) {
        self.postable.extend(other.postable);
        self.dropped.extend(other.dropped);
    }
}

/// Map one chunk's raw comments onto the reviewed file.
pub fn reconcile_comments(
    raw: &[ReviewComment],
    chunk: &Chunk,
    ctx: &ReconcileContext<'_>,
) -> Reconciled {
    let mut out = Reconciled::default();
    let limit = ctx.plausible_limit();
    let side = ctx.side();

    let mut anchored = Vec::new();
    for comment in raw {
        let Some(local) = comment.line_number else {
            out.postable.push(postable(comment, ctx.path, None, side, CommentKind::General));
            continue;
        };
        if local <= 0 {
            drop_comment(&mut out, comment, DropReason::NonPositiveLine { line: local });
            continue;
        }
        let absolute = i64::from(chunk.start_line)
            .checked_add(local - 1)
            .unwrap_or(i64::MAX);
        if absolute > i64::from(limit) {
            drop_comment(
                &mut out,
                comment,
                DropReason::Implausible {
                    line: absolute,
                    limit,
                },
            );
            continue;
        }
        anchored.push(comment.clone());
    }

    for comment in adjust_comment_line_numbers(&anchored, chunk, ctx.total_lines) {
        let line = comment
            .line_number
            .and_then(|l| u32::try_from(l).ok())
            .unwrap_or(1);

        let resolved = match ctx.patch {
            Some(patch) => match patch.reviewable.resolve(line, patch.parsed, patch.target) {
                Some(file_line) => {
                    if !is_valid_line_number(Some(i64::from(file_line)), patch.parsed, patch.target) {
                        let max = patch.target.line_count(patch.parsed);
                        drop_comment(
                            &mut out,
                            &comment,
                            DropReason::OutOfBounds {
                                line: file_line,
                                max,
                            },
                        );
                        continue;
                    }
                    file_line
                }
                None => {
                    drop_comment(&mut out, &comment, DropReason::Unmappable { line });
                    continue;
                }
            },
            None => {
                if line == 0 || line > ctx.total_lines {
                    drop_comment(
                        &mut out,
                        &comment,
                        DropReason::OutOfBounds {
                            line,
                            max: ctx.total_lines,
                        },
                    );
                    continue;
                }
                line
            }
        };

        out.postable
            .push(postable(&comment, ctx.path, Some(resolved), side, CommentKind::Inline));
    }

    out
}

fn postable(
    comment: &ReviewComment,
    path: &str,
    line: Option<u32>,
    side: LineTarget,
    kind: CommentKind,
) -> PostableComment {
    PostableComment {
        path: path.to_string(),
        line,
        side,
        kind,
        severity: comment.severity,
        content: comment.content.clone(),
        suggestion: comment.suggestion.clone(),
    }
}

fn drop_comment(out: &mut Reconciled, comment: &ReviewComment, reason: DropReason) {
    tracing::debug!(%reason, "dropping comment");
    out.dropped.push(DroppedComment {
        comment: comment.clone(),
        reason,
    });
}
