//! Clap argument types, validation, and CLI-to-config layering.

use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

use patchline::config::Config;
use patchline::models::{LineTarget, Severity};

// InputMode is defined in models/ and re-exported here for convenience.
pub use patchline::models::InputMode;

/// Map AI review comments back onto the lines of a pull request.
#[derive(Parser, Debug)]
#[command(name = "patchline", version = patchline::constants::VERSION)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Review changed files with the configured review command.
    Review(Box<ReviewArgs>),

    /// Parse a single-file unified diff and print its structure.
    Parse(ParseArgs),

    /// Split a text file into review chunks.
    Chunk(ChunkArgs),

    /// Map raw review comments for one chunk onto file lines.
    Reconcile(ReconcileArgs),

    /// List known review providers.
    Providers,
}

/// Arguments for the `review` subcommand.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    // --- Repo location ---
    /// Path to the repository or working directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    // --- Input (one required) ---
    /// Pre-computed unified diff file.
    #[arg(long)]
    pub diff_file: Option<PathBuf>,

    /// Read unified diff from stdin.
    #[arg(long, default_value_t = false)]
    pub diff_stdin: bool,

    /// Branch or commit to diff against (uses git diff).
    #[arg(long)]
    pub diff_base: Option<String>,

    /// File or directory to review directly (full contents, no git required).
    #[arg(long)]
    pub scan: Option<PathBuf>,

    /// JSON array of changed files ({filename, status, patch?, content?, size?}).
    #[arg(long)]
    pub files_json: Option<PathBuf>,

    // --- Provider ---
    /// Shell command that performs the review (request JSON on stdin).
    #[arg(long)]
    pub command: Option<String>,

    /// Provider name from `patchline providers`.
    #[arg(long)]
    pub provider: Option<String>,

    /// Model override passed to the review command.
    #[arg(long)]
    pub model: Option<String>,

    /// Reviewer persona passed to the review command.
    #[arg(long)]
    pub persona: Option<String>,

    // --- Mapping and chunking ---
    /// Side of the diff inline comments are anchored to.
    #[arg(long)]
    pub line_target: Option<LineTarget>,

    /// Send only changed lines, without unchanged context.
    #[arg(long, default_value_t = false)]
    pub no_context: bool,

    /// Maximum chunk size in bytes.
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in bytes.
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Max files reviewed concurrently.
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    // --- Output ---
    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Report dropped comments as general comments instead of discarding them.
    #[arg(long, default_value_t = false)]
    pub demote_dropped: bool,

    /// Exit non-zero if comments meet this severity threshold.
    #[arg(long)]
    pub fail_on: Option<Severity>,

    /// Never exit non-zero on comments, even when --fail-on or config is set.
    #[arg(long, default_value_t = false, conflicts_with = "fail_on")]
    pub no_fail: bool,
}

/// Arguments for the `parse` subcommand.
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Diff file to parse; reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,

    /// Print the flattened reviewable text with line origins instead.
    #[arg(long, default_value_t = false)]
    pub reviewable: bool,

    /// Leave context lines out of the reviewable text.
    #[arg(long, default_value_t = false)]
    pub no_context: bool,
}

/// Arguments for the `chunk` subcommand.
#[derive(Parser, Debug)]
pub struct ChunkArgs {
    /// File to chunk; reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub sizes: ChunkSizeArgs,
}

/// Chunk size overrides shared by subcommands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ChunkSizeArgs {
    /// Maximum chunk size in bytes.
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in bytes.
    #[arg(long)]
    pub overlap: Option<usize>,
}

/// Arguments for the `reconcile` subcommand.
#[derive(Parser, Debug)]
pub struct ReconcileArgs {
    /// Raw review output (JSON comments or free text); stdin when omitted or `-`.
    pub comments: Option<PathBuf>,

    /// Single-file diff the chunk was extracted from. Without it the
    /// comments are treated as full-content comments.
    #[arg(long)]
    pub diff: Option<PathBuf>,

    /// First line of the chunk within the reviewed text.
    #[arg(long, default_value_t = 1)]
    pub start_line: u32,

    /// Last line of the chunk (default: end of the reviewed text).
    #[arg(long)]
    pub end_line: Option<u32>,

    /// Line count of the reviewed text; required without --diff.
    #[arg(long, required_unless_present = "diff")]
    pub total_lines: Option<u32>,

    /// File path stamped onto the output comments.
    #[arg(long, default_value = "-")]
    pub file_path: String,

    /// Side of the diff inline comments are anchored to.
    #[arg(long, default_value = "original")]
    pub line_target: LineTarget,

    /// The reviewed text excluded context lines.
    #[arg(long, default_value_t = false)]
    pub no_context: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    /// Render a review result using the renderer for this format.
    pub fn render(&self, result: &patchline::orchestrator::ReviewResult) -> String {
        use patchline::output::OutputRenderer;
        match self {
            OutputFormat::Terminal => patchline::output::terminal::TerminalRenderer.render(result),
            OutputFormat::Json => patchline::output::json::JsonRenderer.render(result),
        }
    }
}

impl ReviewArgs {
    /// Validate that exactly one input source is provided.
    pub fn validate_input(&self) -> Result<InputMode, String> {
        let sources = [
            self.diff_file.is_some(),
            self.diff_stdin,
            self.diff_base.is_some(),
            self.scan.is_some(),
            self.files_json.is_some(),
        ];
        let count = sources.iter().filter(|&&x| x).count();
        const FLAGS: &str = "--diff-file, --diff-stdin, --diff-base, --scan, or --files-json";

        if count == 0 {
            return Err(format!("one input source is required: {FLAGS}"));
        }
        if count > 1 {
            return Err(format!("only one input source allowed: {FLAGS}"));
        }

        if let Some(ref path) = self.diff_file {
            Ok(InputMode::DiffFile(path.clone()))
        } else if self.diff_stdin {
            Ok(InputMode::Stdin)
        } else if let Some(ref base) = self.diff_base {
            Ok(InputMode::GitBase(base.clone()))
        } else if let Some(ref path) = self.scan {
            Ok(InputMode::DirectPath(path.clone()))
        } else if let Some(ref path) = self.files_json {
            Ok(InputMode::FilesJson(path.clone()))
        } else {
            Err(format!("one input source is required: {FLAGS}"))
        }
    }

    /// Apply CLI flags on top of the loaded config (highest priority layer).
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref command) = self.command {
            config.provider.command = Some(command.clone());
        }
        if let Some(ref provider) = self.provider {
            config.provider.name = provider.clone();
        }
        if let Some(ref model) = self.model {
            config.provider.model = Some(model.clone());
        }
        if let Some(ref persona) = self.persona {
            config.review.persona = persona.clone();
        }
        if let Some(target) = self.line_target {
            config.review.line_target = target;
        }
        if self.no_context {
            config.review.include_context = Some(false);
        }
        ChunkSizeArgs {
            max_chunk_size: self.max_chunk_size,
            overlap: self.overlap,
        }
        .apply_to(config);
        if let Some(n) = self.max_concurrent {
            config.review.max_concurrent_files = n;
        }
        if let Some(severity) = self.fail_on {
            config.review.fail_on = Some(severity);
        }
        if self.no_fail {
            config.review.fail_on = None;
        }
    }
}

impl ChunkSizeArgs {
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(size) = self.max_chunk_size {
            config.chunking.max_chunk_size = size;
        }
        if let Some(overlap) = self.overlap {
            config.chunking.overlap = overlap;
        }
    }
}
