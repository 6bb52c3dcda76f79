//! Terminal renderer: styled flowing text grouped by file.

use colored::Colorize;

use crate::models::comment::{PostableComment, Severity};
use crate::orchestrator::ReviewResult;
use crate::output::OutputRenderer;

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer;

impl OutputRenderer for TerminalRenderer {
    fn render(&self, result: &ReviewResult) -> String {
        let mut output = String::new();

        if result.comments.is_empty() {
            output.push_str(&format!("{}", "  ✔ No comments.\n".green()));
        } else {
            let mut sorted: Vec<&PostableComment> = result.comments.iter().collect();
            sorted.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));

            let mut current_file = "";
            for comment in sorted {
                if comment.path != current_file {
                    if !current_file.is_empty() {
                        output.push('\n');
                    }
                    current_file = &comment.path;
                }
                render_comment(&mut output, comment);
            }
        }

        if !result.dropped.is_empty() {
            output.push_str(&format!(
                " {} {} dropped:\n",
                "∅".dimmed(),
                plural(result.dropped.len(), "comment", "comments")
            ));
            for drop in &result.dropped {
                output.push_str(&format!(
                    "   {} {}\n",
                    drop.path.dimmed(),
                    drop.dropped.reason.to_string().dimmed()
                ));
            }
            output.push('\n');
        }

        let summary = result.summary();
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} comments: {} {}, {} {}, {} {}\n",
            summary.total.to_string().bold(),
            summary.errors.to_string().red().bold(),
            if summary.errors == 1 { "error" } else { "errors" },
            summary.warnings.to_string().yellow().bold(),
            if summary.warnings == 1 { "warning" } else { "warnings" },
            summary.info.to_string().blue().bold(),
            if summary.info == 1 { "info" } else { "infos" },
        ));
        output.push_str(&format!(
            " {} reviewed, {} skipped, {}",
            plural(result.files_reviewed, "file", "files"),
            result.files_skipped,
            plural(result.chunks, "chunk", "chunks"),
        ));
        if result.failed_chunks > 0 {
            output.push_str(&format!(
                ", {}",
                format!("{} failed", result.failed_chunks).red()
            ));
        }
        output.push('\n');

        output
    }
}

fn render_comment(output: &mut String, comment: &PostableComment) {
    let (icon, severity_str) = match comment.severity {
        Severity::Error => (
            "✖".red().bold().to_string(),
            "error".red().bold().to_string(),
        ),
        Severity::Warning => (
            "⚠".yellow().bold().to_string(),
            "warning".yellow().bold().to_string(),
        ),
        Severity::Info => (
            "ℹ".blue().bold().to_string(),
            "info".blue().bold().to_string(),
        ),
    };

    let location = match comment.line {
        Some(line) => format!("{}:{}", comment.path, line),
        None => comment.path.clone(),
    };

    output.push_str(&format!(" {} {} in {}\n", icon, severity_str, location.bold()));
    output.push_str(&format!("   {}\n", comment.content));
    if let Some(ref suggestion) = comment.suggestion {
        output.push_str(&format!("   {} {}\n", "→".cyan(), suggestion));
    }
    output.push('\n');
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}
