//! patchline: map AI review comments on pull-request diffs back to
//! source lines (library crate).
//!
//! The core is pure and synchronous: [`parse_diff`] turns a unified diff
//! into hunks with per-line numbers, [`chunk_content`] splits reviewable
//! text into size-bounded chunks, and [`reconcile_comments`] projects a
//! chunk's comments back onto file lines. The orchestrator drives a
//! [`providers::ReviewProvider`] across many files with bounded
//! concurrency.

pub mod chunker;
pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod providers;

pub use chunker::chunk as chunk_content;
pub use diff::parse_diff;
pub use orchestrator::reconcile::{Reconciled, reconcile_comments};
