//! Review orchestrator: per-file content resolution, chunked review
//! requests, and bounded parallel execution across files.

pub mod reconcile;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunker::{self, validate_chunk};
use crate::config::Config;
use crate::diff::mapper::{ExtractOptions, extract_reviewable};
use crate::diff::parse_diff;
use crate::models::chunk::Chunk;
use crate::models::comment::{DroppedComment, PostableComment, Severity, Summary};
use crate::models::diff::LineTarget;
use crate::models::file::{ChangedFile, ContentSource};
use crate::providers::ReviewProvider;

use reconcile::{PatchMapping, ReconcileContext, Reconciled, reconcile_comments};

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("no files to review")]
    NoFiles,
}

/// A dropped comment with the file it was reported against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDrop {
    pub path: String,
    #[serde(flatten)]
    pub dropped: DroppedComment,
}

/// What happened to one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOutcome {
    /// `true` when the file had nothing reviewable.
    pub skipped: bool,
    pub chunks: usize,
    /// Chunks whose review request failed.
    pub failed_chunks: usize,
    pub reconciled: Reconciled,
}

/// Result of a review run, including partial results from failed chunks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewResult {
    /// Postable comments in input file order.
    pub comments: Vec<PostableComment>,
    pub dropped: Vec<FileDrop>,
    pub files_reviewed: usize,
    pub files_skipped: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
}

impl ReviewResult {
    pub fn summary(&self) -> Summary {
        Summary::from_comments(&self.comments)
    }

    /// Turn every dropped comment into a general comment on its file.
    pub fn demote_dropped(&mut self, side: LineTarget) {
        for drop in std::mem::take(&mut self.dropped) {
            self.comments.push(drop.dropped.into_general(&drop.path, side));
        }
    }

    /// Whether any comment is at or above `threshold`.
    pub fn has_severity_at_least(&self, threshold: Severity) -> bool {
        self.comments.iter().any(|c| c.severity >= threshold)
    }

    fn absorb(&mut self, path: &str, outcome: FileOutcome) {
        if outcome.skipped {
            self.files_skipped += 1;
            return;
        }
        self.files_reviewed += 1;
        self.chunks += outcome.chunks;
        self.failed_chunks += outcome.failed_chunks;
        self.comments.extend(outcome.reconciled.postable);
        self.dropped
            .extend(outcome.reconciled.dropped.into_iter().map(|dropped| FileDrop {
                path: path.to_string(),
                dropped,
            }));
    }
}

/// Orchestrates review requests across files.
pub struct ReviewOrchestrator {
    provider: Arc<dyn ReviewProvider>,
    config: Arc<Config>,
}

impl ReviewOrchestrator {
    pub fn new(provider: Arc<dyn ReviewProvider>, config: &Config) -> Self {
        Self {
            provider,
            config: Arc::new(config.clone()),
        }
    }

    /// Review every file, at most `review.max_concurrent_files` at a time.
    ///
    /// A failing file or chunk never aborts the others; failures are
    /// counted in the result.
    pub async fn run(&self, files: &[ChangedFile]) -> Result<ReviewResult, OrchestratorError> {
        if files.is_empty() {
            return Err(OrchestratorError::NoFiles);
        }

        let semaphore = Arc::new(Semaphore::new(self.config.review.max_concurrent_files.max(1)));
        let mut join_set = JoinSet::new();

        for (index, file) in files.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let config = Arc::clone(&self.config);
            let sem = Arc::clone(&semaphore);
            let file = file.clone();

            join_set.spawn(async move {
                // The semaphore is never closed.
                let _permit = sem.acquire_owned().await.ok();
                let outcome = review_file(provider.as_ref(), &config, &file).await;
                (index, file.filename, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(files.len());
        let mut panicked = 0usize;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(done) => outcomes.push(done),
                Err(e) => {
                    tracing::warn!(error = %e, "review task panicked");
                    panicked += 1;
                }
            }
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut result = ReviewResult::default();
        for (_, path, outcome) in outcomes {
            result.absorb(&path, outcome);
        }
        result.failed_chunks += panicked;

        tracing::info!(
            reviewed = result.files_reviewed,
            skipped = result.files_skipped,
            chunks = result.chunks,
            failed = result.failed_chunks,
            comments = result.comments.len(),
            dropped = result.dropped.len(),
            "review finished"
        );
        Ok(result)
    }
}

/// Review one file: resolve its content, chunk it, request each chunk in
/// order, and reconcile the comments.
pub async fn review_file(
    provider: &dyn ReviewProvider,
    config: &Config,
    file: &ChangedFile,
) -> FileOutcome {
    match file.content_source() {
        ContentSource::None => {
            tracing::debug!(path = %file.filename, "no patch or content; skipping");
            FileOutcome {
                skipped: true,
                ..FileOutcome::default()
            }
        }
        ContentSource::Patch(patch) => review_patch(provider, config, file, patch).await,
        ContentSource::Full(content) => {
            let total_lines = line_total(chunker::line_count(content));
            let ctx = ReconcileContext {
                path: &file.filename,
                total_lines,
                size_bytes: Some(file.size.unwrap_or(content.len() as u64)),
                patch: None,
            };
            review_chunks(provider, config, file, content, &ctx).await
        }
    }
}

async fn review_patch(
    provider: &dyn ReviewProvider,
    config: &Config,
    file: &ChangedFile,
    patch: &str,
) -> FileOutcome {
    let parsed = parse_diff(patch);
    if !parsed.has_content() {
        tracing::debug!(path = %file.filename, "patch has no hunks; nothing to review");
        return FileOutcome::default();
    }

    let reviewable = extract_reviewable(
        &parsed,
        ExtractOptions {
            include_context: config.review.include_context(),
            max_lines: config.review.max_reviewable_lines,
        },
    );
    if reviewable.is_empty() {
        tracing::debug!(path = %file.filename, "patch has no reviewable lines");
        return FileOutcome::default();
    }

    let ctx = ReconcileContext {
        path: &file.filename,
        total_lines: line_total(reviewable.line_count()),
        size_bytes: file.size,
        patch: Some(PatchMapping {
            parsed: &parsed,
            reviewable: &reviewable,
            target: config.review.line_target,
        }),
    };
    review_chunks(provider, config, file, &reviewable.text, &ctx).await
}

async fn review_chunks(
    provider: &dyn ReviewProvider,
    config: &Config,
    file: &ChangedFile,
    text: &str,
    ctx: &ReconcileContext<'_>,
) -> FileOutcome {
    let chunks = chunker::chunk(text, config.chunking);
    let mut outcome = FileOutcome {
        chunks: chunks.len(),
        ..FileOutcome::default()
    };
    let language = file.language();

    for chunk in &chunks {
        let validation = validate_chunk(chunk);
        if !validation.is_valid {
            tracing::warn!(
                path = %file.filename,
                chunk = chunk.chunk_index + 1,
                issues = %validation.issues.join("; "),
                "chunk boundary may split a construct"
            );
        }

        let context = chunk_context(file, chunk);
        match provider
            .review_code(&chunk.content, language, &config.review.persona, &context)
            .await
        {
            Ok(raw) => {
                let reconciled = reconcile_comments(&raw, chunk, ctx);
                if !reconciled.dropped.is_empty() {
                    tracing::warn!(
                        path = %file.filename,
                        chunk = chunk.chunk_index + 1,
                        dropped = reconciled.dropped.len(),
                        "dropped comments with unusable line numbers"
                    );
                }
                outcome.reconciled.extend(reconciled);
            }
            Err(e) => {
                tracing::warn!(
                    path = %file.filename,
                    chunk = chunk.chunk_index + 1,
                    error = %e,
                    "review request failed"
                );
                outcome.failed_chunks += 1;
            }
        }
    }

    outcome
}

/// Context line sent with each chunk.
fn chunk_context(file: &ChangedFile, chunk: &Chunk) -> String {
    format!(
        "File: {} ({}), chunk {}/{}, lines {}-{}",
        file.filename,
        file.status,
        chunk.chunk_index + 1,
        chunk.total_chunks,
        chunk.start_line,
        chunk.end_line
    )
}

fn line_total(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comment::ReviewComment;
    use crate::models::file::FileStatus;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every request with fixed comments and records the contexts.
    struct FixedProvider {
        comments: Vec<ReviewComment>,
        contexts: Mutex<Vec<String>>,
    }

    impl FixedProvider {
        fn new(comments: Vec<ReviewComment>) -> Self {
            Self {
                comments,
                contexts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReviewProvider for FixedProvider {
        async fn review_code(
            &self,
            _text: &str,
            _language: &str,
            _persona: &str,
            context: &str,
        ) -> Result<Vec<ReviewComment>, ProviderError> {
            self.contexts.lock().unwrap().push(context.to_string());
            Ok(self.comments.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ReviewProvider for FailingProvider {
        async fn review_code(
            &self,
            _text: &str,
            _language: &str,
            _persona: &str,
            _context: &str,
        ) -> Result<Vec<ReviewComment>, ProviderError> {
            Err(ProviderError::ApiError("boom".into()))
        }
    }

    fn full_file(name: &str, content: &str) -> ChangedFile {
        ChangedFile {
            filename: name.into(),
            status: FileStatus::Added,
            content: Some(content.into()),
            ..ChangedFile::default()
        }
    }

    #[tokio::test]
    async fn file_without_content_is_skipped() {
        let provider = FixedProvider::new(vec![ReviewComment::general("x")]);
        let file = ChangedFile {
            filename: "empty.rs".into(),
            ..ChangedFile::default()
        };
        let outcome = review_file(&provider, &Config::default(), &file).await;
        assert!(outcome.skipped);
        assert!(provider.contexts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_without_hunks_yields_nothing() {
        let provider = FixedProvider::new(vec![ReviewComment::general("x")]);
        let file = ChangedFile {
            filename: "a.rs".into(),
            patch: Some("just some text\n".into()),
            ..ChangedFile::default()
        };
        let outcome = review_file(&provider, &Config::default(), &file).await;
        assert!(!outcome.skipped);
        assert_eq!(outcome.chunks, 0);
        assert!(outcome.reconciled.postable.is_empty());
    }

    #[tokio::test]
    async fn full_content_comment_keeps_line() {
        let provider = FixedProvider::new(vec![ReviewComment::inline(2, "rename")]);
        let file = full_file("main.rs", "fn main() {\n    let x = 1;\n}\n");
        let outcome = review_file(&provider, &Config::default(), &file).await;
        assert_eq!(outcome.chunks, 1);
        assert_eq!(outcome.reconciled.postable[0].line, Some(2));
        let contexts = provider.contexts.lock().unwrap();
        assert_eq!(contexts[0], "File: main.rs (added), chunk 1/1, lines 1-3");
    }

    #[tokio::test]
    async fn failed_chunks_are_counted() {
        let file = full_file("main.rs", "fn main() {}\n");
        let outcome = review_file(&FailingProvider, &Config::default(), &file).await;
        assert_eq!(outcome.chunks, 1);
        assert_eq!(outcome.failed_chunks, 1);
    }

    #[tokio::test]
    async fn run_rejects_empty_input() {
        let orchestrator = ReviewOrchestrator::new(
            Arc::new(FixedProvider::new(Vec::new())),
            &Config::default(),
        );
        assert!(matches!(orchestrator.run(&[]).await, Err(OrchestratorError::NoFiles)));
    }

    #[tokio::test]
    async fn run_keeps_input_order_and_counts() {
        let provider = Arc::new(FixedProvider::new(vec![ReviewComment::inline(1, "first line")]));
        let orchestrator = ReviewOrchestrator::new(provider, &Config::default());
        let files = vec![
            full_file("a.rs", "a\n"),
            ChangedFile {
                filename: "skip.rs".into(),
                ..ChangedFile::default()
            },
            full_file("b.rs", "b\n"),
        ];
        let result = orchestrator.run(&files).await.unwrap();
        assert_eq!(result.files_reviewed, 2);
        assert_eq!(result.files_skipped, 1);
        assert_eq!(result.chunks, 2);
        let paths: Vec<_> = result.comments.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.rs"]);
        assert_eq!(result.summary().inline, 2);
    }

    #[tokio::test]
    async fn demote_dropped_moves_into_comments() {
        let provider = Arc::new(FixedProvider::new(vec![
            ReviewComment::inline(999_999, "ghost"),
            ReviewComment::general("overall fine"),
        ]));
        let orchestrator = ReviewOrchestrator::new(provider, &Config::default());
        let mut result = orchestrator.run(&[full_file("a.rs", "a\nb\n")]).await.unwrap();
        assert_eq!(result.dropped.len(), 1);
        // Only the general comment (info) survived.
        assert!(!result.has_severity_at_least(Severity::Warning));
        assert!(result.has_severity_at_least(Severity::Info));

        result.demote_dropped(LineTarget::Modified);
        assert!(result.dropped.is_empty());
        assert_eq!(result.comments.len(), 2);
        assert_eq!(result.comments[1].content, "ghost");
        assert_eq!(result.comments[1].line, None);
        assert_eq!(result.comments[1].path, "a.rs");
    }

    #[test]
    fn chunk_context_format() {
        let file = ChangedFile {
            filename: "src/x.rs".into(),
            status: FileStatus::Modified,
            ..ChangedFile::default()
        };
        let chunk = Chunk {
            content: String::new(),
            start_line: 18,
            end_line: 40,
            chunk_index: 1,
            total_chunks: 3,
        };
        assert_eq!(
            chunk_context(&file, &chunk),
            "File: src/x.rs (modified), chunk 2/3, lines 18-40"
        );
    }
}
