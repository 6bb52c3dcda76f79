//! Integration tests using a mock review provider.
//!
//! Drive the orchestrator end-to-end without running any review command:
//! the mock answers each chunk with canned comments so the line mapping
//! can be checked against known diff positions.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use patchline::chunk_content;
use patchline::config::Config;
use patchline::models::{
    ChangedFile, ChunkOptions, CommentKind, DropReason, FileStatus, LineTarget, ReviewComment,
};
use patchline::orchestrator::ReviewOrchestrator;
use patchline::providers::{ProviderError, ReviewProvider};

const TWO_HUNK_PATCH: &str = "\
@@ -5,3 +5,3 @@ fn setup() {
-const oldValue = \"old\";
+const newValue = \"new\";
 const otherVariable = true;
 const third = 3;
@@ -40,2 +40,3 @@ fn tail() {
 fn tail() {
+    log();
 }
";

/// A mock review provider that returns canned comments and records calls.
struct MockProvider {
    comments: Vec<ReviewComment>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(comments: Vec<ReviewComment>) -> Self {
        Self {
            comments,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewProvider for MockProvider {
    async fn review_code(
        &self,
        _text: &str,
        _language: &str,
        _persona: &str,
        context: &str,
    ) -> Result<Vec<ReviewComment>, ProviderError> {
        self.calls.lock().unwrap().push(context.to_string());
        Ok(self.comments.clone())
    }
}

fn patch_file(name: &str, patch: &str) -> ChangedFile {
    ChangedFile {
        filename: name.to_string(),
        status: FileStatus::Modified,
        patch: Some(patch.to_string()),
        ..ChangedFile::default()
    }
}

fn full_file(name: &str, content: &str) -> ChangedFile {
    ChangedFile {
        filename: name.to_string(),
        status: FileStatus::Added,
        content: Some(content.to_string()),
        size: Some(content.len() as u64),
        ..ChangedFile::default()
    }
}

#[tokio::test]
async fn patch_comments_map_to_original_lines() {
    let provider = Arc::new(MockProvider::new(vec![
        ReviewComment::inline(1, "old value removed"),
        ReviewComment::inline(5, "tail changed"),
        ReviewComment::general("looks fine overall"),
    ]));
    let orchestrator = ReviewOrchestrator::new(provider.clone(), &Config::default());

    let result = orchestrator
        .run(&[patch_file("src/app.js", TWO_HUNK_PATCH)])
        .await
        .unwrap();

    assert_eq!(result.files_reviewed, 1);
    assert_eq!(result.chunks, 1);
    assert_eq!(provider.call_count(), 1);

    let lines: Vec<_> = result.comments.iter().map(|c| c.line).collect();
    assert_eq!(lines, vec![None, Some(5), Some(40)]);
    assert_eq!(result.comments[0].kind, CommentKind::General);
    assert!(result.comments.iter().all(|c| c.path == "src/app.js"));
    assert!(result.dropped.is_empty());
}

#[tokio::test]
async fn patch_comment_on_added_line_follows_line_target() {
    let comments = vec![ReviewComment::inline(2, "new constant")];

    let original = ReviewOrchestrator::new(
        Arc::new(MockProvider::new(comments.clone())),
        &Config::default(),
    )
    .run(&[patch_file("a.js", TWO_HUNK_PATCH)])
    .await
    .unwrap();
    assert!(original.comments.is_empty());
    assert_eq!(original.dropped[0].dropped.reason, DropReason::Unmappable { line: 2 });

    let mut config = Config::default();
    config.review.line_target = LineTarget::Modified;
    let modified = ReviewOrchestrator::new(Arc::new(MockProvider::new(comments)), &config)
        .run(&[patch_file("a.js", TWO_HUNK_PATCH)])
        .await
        .unwrap();
    assert_eq!(modified.comments[0].line, Some(5));
    assert_eq!(modified.comments[0].side, LineTarget::Modified);
}

#[tokio::test]
async fn changed_lines_only_review_uses_its_own_numbering() {
    // Without context the reviewable text is: -old, +new, +log.
    let provider = Arc::new(MockProvider::new(vec![ReviewComment::inline(3, "logging")]));
    let mut config = Config::default();
    config.review.include_context = Some(false);
    config.review.line_target = LineTarget::Modified;

    let result = ReviewOrchestrator::new(provider, &config)
        .run(&[patch_file("a.js", TWO_HUNK_PATCH)])
        .await
        .unwrap();
    assert_eq!(result.comments[0].line, Some(41));
}

#[tokio::test]
async fn hallucinated_line_is_dropped_not_posted() {
    let content: String = (1..=50).map(|i| format!("let v{i} = {i};\n")).collect();
    let provider = Arc::new(MockProvider::new(vec![ReviewComment::inline(
        999_999,
        "somewhere far away",
    )]));

    let result = ReviewOrchestrator::new(provider, &Config::default())
        .run(&[full_file("src/vars.rs", &content)])
        .await
        .unwrap();

    assert!(result.comments.is_empty());
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(result.dropped[0].path, "src/vars.rs");
    assert!(matches!(
        result.dropped[0].dropped.reason,
        DropReason::Implausible { line: 999_999, .. }
    ));
}

#[tokio::test]
async fn full_content_chunks_offset_comment_lines() {
    let content: String = (1..=40).map(|i| format!("line {i:04}\n")).collect();
    let options = ChunkOptions {
        max_chunk_size: 100,
        overlap: 20,
    };
    let mut config = Config::default();
    config.chunking = options;

    let provider = Arc::new(MockProvider::new(vec![ReviewComment::inline(1, "first")]));
    let result = ReviewOrchestrator::new(provider.clone(), &config)
        .run(&[full_file("notes.txt", &content)])
        .await
        .unwrap();

    let expected: Vec<_> = chunk_content(&content, options)
        .iter()
        .map(|c| Some(c.start_line))
        .collect();
    assert!(expected.len() > 1);
    assert_eq!(result.chunks, expected.len());
    assert_eq!(provider.call_count(), expected.len());

    let lines: Vec<_> = result.comments.iter().map(|c| c.line).collect();
    assert_eq!(lines, expected);

    // Chunks of one file are requested in order.
    let calls = provider.calls.lock().unwrap();
    for (i, call) in calls.iter().enumerate() {
        assert!(
            call.contains(&format!("chunk {}/{}", i + 1, expected.len())),
            "call {i}: {call}"
        );
    }
}

#[tokio::test]
async fn files_without_content_are_skipped() {
    let provider = Arc::new(MockProvider::new(vec![ReviewComment::general("x")]));
    let binary = ChangedFile {
        filename: "logo.png".to_string(),
        status: FileStatus::Added,
        ..ChangedFile::default()
    };
    let blank_patch = patch_file("blank.rs", "   \n");

    let result = ReviewOrchestrator::new(provider.clone(), &Config::default())
        .run(&[binary, blank_patch, full_file("ok.rs", "fn ok() {}\n")])
        .await
        .unwrap();

    assert_eq!(result.files_skipped, 2);
    assert_eq!(result.files_reviewed, 1);
    assert_eq!(provider.call_count(), 1);
}

/// Fails for one file and answers the rest.
struct FlakyProvider;

#[async_trait]
impl ReviewProvider for FlakyProvider {
    async fn review_code(
        &self,
        _text: &str,
        _language: &str,
        _persona: &str,
        context: &str,
    ) -> Result<Vec<ReviewComment>, ProviderError> {
        if context.contains("bad.rs") {
            return Err(ProviderError::ApiError("rate limited".into()));
        }
        Ok(vec![ReviewComment::inline(1, "ok")])
    }
}

#[tokio::test]
async fn provider_failure_does_not_abort_siblings() {
    let files = vec![
        full_file("good1.rs", "a\n"),
        full_file("bad.rs", "b\n"),
        full_file("good2.rs", "c\n"),
    ];
    let result = ReviewOrchestrator::new(Arc::new(FlakyProvider), &Config::default())
        .run(&files)
        .await
        .unwrap();

    assert_eq!(result.files_reviewed, 3);
    assert_eq!(result.failed_chunks, 1);
    let paths: Vec<_> = result.comments.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["good1.rs", "good2.rs"]);
}

/// Tracks how many requests are in flight at once.
struct SlowProvider {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ReviewProvider for SlowProvider {
    async fn review_code(
        &self,
        _text: &str,
        _language: &str,
        _persona: &str,
        _context: &str,
    ) -> Result<Vec<ReviewComment>, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let provider = Arc::new(SlowProvider {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let mut config = Config::default();
    config.review.max_concurrent_files = 2;

    let files: Vec<_> = (0..8)
        .map(|i| full_file(&format!("f{i}.rs"), "fn f() {}\n"))
        .collect();
    let result = ReviewOrchestrator::new(provider.clone(), &config)
        .run(&files)
        .await
        .unwrap();

    assert_eq!(result.files_reviewed, 8);
    let peak = provider.peak.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 2, "peak concurrency was {peak}");
}
