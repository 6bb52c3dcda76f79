mod cli;

use patchline::chunker;
use patchline::config;
use patchline::constants;
use patchline::diff;
use patchline::env;
use patchline::logging;
use patchline::orchestrator;
use patchline::providers;

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use cli::args::{ChunkArgs, Cli, Command, ParseArgs, ReconcileArgs, ReviewArgs};
use config::Config;
use diff::mapper::{ExtractOptions, extract_reviewable};
use env::Env;
use orchestrator::ReviewOrchestrator;
use orchestrator::reconcile::{PatchMapping, ReconcileContext, reconcile_comments};
use patchline::models::Chunk;
use providers::command::CommandProvider;
use providers::response::parse_review_response;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let env = Env::real();
    logging::init(&env, cli.verbose)?;

    match cli.command {
        Command::Review(args) => run_review(*args, &env).await,
        Command::Parse(args) => run_parse(args).await,
        Command::Chunk(args) => run_chunk(args, &env).await,
        Command::Reconcile(args) => run_reconcile(args).await,
        Command::Providers => run_providers(),
    }
}

async fn run_review(args: ReviewArgs, env: &Env) -> Result<()> {
    let input_mode = args
        .validate_input()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    // Resolve repo / working directory from --path (default: cwd)
    let base_dir = std::fs::canonicalize(&args.path)
        .with_context(|| format!("--path directory not found: {}", args.path.display()))?;
    let repo_root = diff::git::find_repo_root(&base_dir)
        .await
        .unwrap_or_else(|_| base_dir.clone());

    let mut config =
        Config::load(Some(&repo_root), env).context("failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let files = diff::get_changed_files(&input_mode, &repo_root)
        .await
        .context("failed to get changed files")?;
    if files.is_empty() {
        eprintln!("No changes to review.");
        return Ok(());
    }

    let provider = CommandProvider::from_config(&config.provider, repo_root.clone())?;
    let orchestrator = ReviewOrchestrator::new(Arc::new(provider), &config);
    let mut result = orchestrator.run(&files).await?;

    if args.demote_dropped {
        result.demote_dropped(config.review.line_target);
    }

    print!("{}", args.format.render(&result));

    if result.failed_chunks > 0 {
        eprintln!(
            "{} {} chunk request(s) failed; run with -v for details.",
            "⚠".yellow().bold(),
            result.failed_chunks
        );
    }

    if let Some(threshold) = config.review.fail_on {
        if result.has_severity_at_least(threshold) {
            process::exit(1);
        }
    }
    Ok(())
}

/// Parse a single-file diff and print it as JSON.
async fn run_parse(args: ParseArgs) -> Result<()> {
    let text = cli::read_input(args.file.as_deref()).await?;
    let parsed = diff::parse_diff(&text);

    let output = if args.reviewable {
        let reviewable = extract_reviewable(
            &parsed,
            ExtractOptions {
                include_context: !args.no_context,
                ..ExtractOptions::default()
            },
        );
        serde_json::to_string_pretty(&reviewable)?
    } else {
        serde_json::to_string_pretty(&parsed)?
    };
    println!("{output}");
    Ok(())
}

/// Chunk a file and print the chunks with their syntax checks as JSON.
async fn run_chunk(args: ChunkArgs, env: &Env) -> Result<()> {
    let text = cli::read_input(args.file.as_deref()).await?;

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let mut config = Config::load(Some(&cwd), env).context("failed to load configuration")?;
    args.sizes.apply_to(&mut config);
    config.validate()?;

    let chunks: Vec<_> = chunker::chunk(&text, config.chunking)
        .into_iter()
        .map(|chunk| {
            let validation = chunker::validate_chunk(&chunk);
            serde_json::json!({ "chunk": chunk, "validation": validation })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}

/// Reconcile raw review output for one chunk and print the result as JSON.
async fn run_reconcile(args: ReconcileArgs) -> Result<()> {
    let raw_text = cli::read_input(args.comments.as_deref()).await?;
    let raw = parse_review_response(&raw_text).into_comments();

    let patch_text = match &args.diff {
        Some(path) => Some(cli::read_input(Some(path.as_path())).await?),
        None => None,
    };
    let parsed = patch_text.as_deref().map(diff::parse_diff);
    let reviewable = parsed.as_ref().map(|p| {
        extract_reviewable(
            p,
            ExtractOptions {
                include_context: !args.no_context,
                ..ExtractOptions::default()
            },
        )
    });

    let total_lines = match (&reviewable, args.total_lines) {
        (_, Some(n)) => n,
        (Some(r), None) => u32::try_from(r.line_count()).unwrap_or(u32::MAX),
        (None, None) => anyhow::bail!("--total-lines is required without --diff"),
    };
    let chunk = Chunk {
        content: String::new(),
        start_line: args.start_line.max(1),
        end_line: args.end_line.unwrap_or(total_lines).max(args.start_line.max(1)),
        chunk_index: 0,
        total_chunks: 1,
    };
    let ctx = ReconcileContext {
        path: &args.file_path,
        total_lines,
        size_bytes: None,
        patch: match (&parsed, &reviewable) {
            (Some(parsed), Some(reviewable)) => Some(PatchMapping {
                parsed,
                reviewable,
                target: args.line_target,
            }),
            _ => None,
        },
    };

    let reconciled = reconcile_comments(&raw, &chunk, &ctx);
    println!("{}", serde_json::to_string_pretty(&reconciled)?);
    Ok(())
}

/// List the provider registry.
fn run_providers() -> Result<()> {
    println!("{}", format!("{} providers", constants::APP_NAME).bold());
    for spec in providers::registry::PROVIDERS {
        let default_marker = if spec.name == providers::registry::DEFAULT_PROVIDER {
            " (default)".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}{}\n    {} {}\n    {}  {}\n    {}    {}",
            spec.name.bold(),
            default_marker,
            "model:".dimmed(),
            spec.default_model,
            "key:".dimmed(),
            spec.api_key_env,
            "url:".dimmed(),
            spec.base_url.unwrap_or("(from config)"),
        );
    }
    Ok(())
}
