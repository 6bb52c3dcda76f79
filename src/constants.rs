//! App-wide constants.
//!
//! Tool name, config paths and environment variable names live here so a
//! rename only touches this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "patchline";

/// Crate version, shown by `--version` and in JSON output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.patchline.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".patchline.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "patchline";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_LOG: &str = "PATCHLINE_LOG";
pub const ENV_PROVIDER: &str = "PATCHLINE_PROVIDER";
pub const ENV_MODEL: &str = "PATCHLINE_MODEL";
pub const ENV_API_KEY: &str = "PATCHLINE_API_KEY";
pub const ENV_BASE_URL: &str = "PATCHLINE_BASE_URL";
pub const ENV_COMMAND: &str = "PATCHLINE_COMMAND";
pub const ENV_MAX_CHUNK_SIZE: &str = "PATCHLINE_MAX_CHUNK_SIZE";
pub const ENV_OVERLAP: &str = "PATCHLINE_OVERLAP";
pub const ENV_CONCURRENCY: &str = "PATCHLINE_CONCURRENCY";
pub const ENV_LINE_TARGET: &str = "PATCHLINE_LINE_TARGET";
