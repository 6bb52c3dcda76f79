//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.patchline.toml` in repo root
//! 4. `~/.config/patchline/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants;
use crate::diff::mapper::DEFAULT_MAX_REVIEWABLE_LINES;
use crate::env::Env;
use crate::models::chunk::ChunkOptions;
use crate::models::comment::Severity;
use crate::models::diff::LineTarget;
use crate::providers::registry::{self, DEFAULT_PROVIDER};

/// Default number of files reviewed concurrently.
pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 4;

/// Default per-call timeout for the review command, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default reviewer persona passed to the provider.
pub const DEFAULT_PERSONA: &str = "senior software engineer";

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub review: ReviewConfig,
    pub chunking: ChunkOptions,
    pub provider: ProviderConfig,
}

/// Review pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Upper bound on files reviewed at once.
    pub max_concurrent_files: usize,
    /// Side of the diff inline comments are anchored to.
    pub line_target: LineTarget,
    /// Whether context lines are sent along with changed lines. Unset
    /// means yes; kept optional so a later layer can turn it back on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_context: Option<bool>,
    /// Cap on reviewable lines extracted from one patch.
    pub max_reviewable_lines: usize,
    pub persona: String,
    /// Exit non-zero when any comment reaches this severity.
    pub fail_on: Option<Severity>,
}

impl ReviewConfig {
    /// Effective context setting.
    pub fn include_context(&self) -> bool {
        self.include_context.unwrap_or(true)
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            line_target: LineTarget::default(),
            include_context: None,
            max_reviewable_lines: DEFAULT_MAX_REVIEWABLE_LINES,
            persona: DEFAULT_PERSONA.to_string(),
            fail_on: None,
        }
    }
}

/// Review backend configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registry name of the backend.
    pub name: String,
    /// Model override; the registry default is used when unset.
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Shell command that performs the review.
    pub command: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("command", &self.command)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER.to_string(),
            model: None,
            base_url: None,
            api_key: None,
            command: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: repo-local config
        if let Some(root) = repo_root {
            let local_path = root.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.max_chunk_size == 0 {
            return Err(ConfigError::Invalid("chunking.max_chunk_size must be > 0".into()));
        }
        if self.chunking.overlap >= self.chunking.max_chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_chunk_size ({})",
                self.chunking.overlap, self.chunking.max_chunk_size
            )));
        }
        if self.review.max_concurrent_files == 0 {
            return Err(ConfigError::Invalid(
                "review.max_concurrent_files must be > 0".into(),
            ));
        }
        if registry::lookup(&self.provider.name).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown provider '{}' (known: {})",
                self.provider.name,
                registry::known_names()
            )));
        }
        Ok(())
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other wins for non-default values).
    fn merge(&mut self, other: Config) {
        let default_review = ReviewConfig::default();
        if other.review.max_concurrent_files != default_review.max_concurrent_files {
            self.review.max_concurrent_files = other.review.max_concurrent_files;
        }
        if other.review.line_target != default_review.line_target {
            self.review.line_target = other.review.line_target;
        }
        if other.review.include_context.is_some() {
            self.review.include_context = other.review.include_context;
        }
        if other.review.max_reviewable_lines != default_review.max_reviewable_lines {
            self.review.max_reviewable_lines = other.review.max_reviewable_lines;
        }
        if other.review.persona != default_review.persona {
            self.review.persona = other.review.persona;
        }
        if other.review.fail_on.is_some() {
            self.review.fail_on = other.review.fail_on;
        }

        let default_chunking = ChunkOptions::default();
        if other.chunking.max_chunk_size != default_chunking.max_chunk_size {
            self.chunking.max_chunk_size = other.chunking.max_chunk_size;
        }
        if other.chunking.overlap != default_chunking.overlap {
            self.chunking.overlap = other.chunking.overlap;
        }

        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model.is_some() {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }
        if other.provider.command.is_some() {
            self.provider.command = other.provider.command;
        }
        if other.provider.timeout_secs != default_provider.timeout_secs {
            self.provider.timeout_secs = other.provider.timeout_secs;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.non_empty(constants::ENV_PROVIDER) {
            if registry::lookup(&val).is_some() {
                self.provider.name = val;
            } else {
                tracing::warn!("ignoring invalid {} value: {val}", constants::ENV_PROVIDER);
            }
        }
        if let Some(val) = env.non_empty(constants::ENV_MODEL) {
            self.provider.model = Some(val);
        }
        if let Some(val) = env.non_empty(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }
        if let Some(val) = env.non_empty(constants::ENV_COMMAND) {
            self.provider.command = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env.non_empty(constants::ENV_API_KEY).or_else(|| {
            registry::lookup(&self.provider.name).and_then(|spec| env.non_empty(spec.api_key_env))
        });
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        match env.parsed::<usize>(constants::ENV_MAX_CHUNK_SIZE) {
            Some(Ok(v)) if v > 0 => self.chunking.max_chunk_size = v,
            Some(_) => warn_invalid(env, constants::ENV_MAX_CHUNK_SIZE),
            None => {}
        }
        match env.parsed::<usize>(constants::ENV_OVERLAP) {
            Some(Ok(v)) => self.chunking.overlap = v,
            Some(Err(_)) => warn_invalid(env, constants::ENV_OVERLAP),
            None => {}
        }
        match env.parsed::<usize>(constants::ENV_CONCURRENCY) {
            Some(Ok(v)) if v > 0 => self.review.max_concurrent_files = v,
            Some(_) => warn_invalid(env, constants::ENV_CONCURRENCY),
            None => {}
        }
        match env.parsed::<LineTarget>(constants::ENV_LINE_TARGET) {
            Some(Ok(v)) => self.review.line_target = v,
            Some(Err(_)) => warn_invalid(env, constants::ENV_LINE_TARGET),
            None => {}
        }
    }
}

fn warn_invalid(env: &Env, name: &str) {
    let val = env.var(name).unwrap_or_default();
    tracing::warn!("ignoring invalid {name} value: {val}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.provider.name, "anthropic");
        assert_eq!(config.provider.model, None);
        assert_eq!(config.provider.timeout_secs, 300);
        assert_eq!(config.review.max_concurrent_files, 4);
        assert_eq!(config.review.line_target, LineTarget::Original);
        assert!(config.review.include_context());
        assert_eq!(config.chunking, ChunkOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[review]
max_concurrent_files = 8
line_target = "modified"
include_context = false
fail_on = "error"

[chunking]
max_chunk_size = 20000
overlap = 500

[provider]
name = "openai"
model = "gpt-4o"
command = "my-reviewer --json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.review.max_concurrent_files, 8);
        assert_eq!(config.review.line_target, LineTarget::Modified);
        assert!(!config.review.include_context());
        assert_eq!(config.review.fail_on, Some(Severity::Error));
        assert_eq!(config.chunking.max_chunk_size, 20_000);
        assert_eq!(config.chunking.overlap, 500);
        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.provider.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.provider.command.as_deref(), Some("my-reviewer --json"));
    }

    #[test]
    fn partial_chunking_section_keeps_defaults() {
        let config: Config = toml::from_str("[chunking]\noverlap = 10\n").unwrap();
        assert_eq!(config.chunking.overlap, 10);
        assert_eq!(config.chunking.max_chunk_size, ChunkOptions::default().max_chunk_size);
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        let mut other = Config::default();

        other.review.max_concurrent_files = 2;
        other.review.line_target = LineTarget::Modified;
        other.review.include_context = Some(false);
        other.review.max_reviewable_lines = 200;
        other.review.persona = "security auditor".to_string();
        other.review.fail_on = Some(Severity::Warning);
        other.chunking.max_chunk_size = 1000;
        other.chunking.overlap = 10;
        other.provider.name = "openai".to_string();
        other.provider.model = Some("gpt-4o".to_string());
        other.provider.base_url = Some("https://custom.api".to_string());
        other.provider.api_key = Some("sk-test".to_string());
        other.provider.command = Some("review.sh".to_string());
        other.provider.timeout_secs = 30;

        base.merge(other);

        assert_eq!(base.review.max_concurrent_files, 2);
        assert_eq!(base.review.line_target, LineTarget::Modified);
        assert!(!base.review.include_context());
        assert_eq!(base.review.max_reviewable_lines, 200);
        assert_eq!(base.review.persona, "security auditor");
        assert_eq!(base.review.fail_on, Some(Severity::Warning));
        assert_eq!(base.chunking.max_chunk_size, 1000);
        assert_eq!(base.chunking.overlap, 10);
        assert_eq!(base.provider.name, "openai");
        assert_eq!(base.provider.model.as_deref(), Some("gpt-4o"));
        assert_eq!(base.provider.base_url.as_deref(), Some("https://custom.api"));
        assert_eq!(base.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(base.provider.command.as_deref(), Some("review.sh"));
        assert_eq!(base.provider.timeout_secs, 30);
    }

    #[test]
    fn later_layer_can_reenable_context() {
        let mut base: Config = toml::from_str("[review]\ninclude_context = false\n").unwrap();
        assert!(!base.review.include_context());

        base.merge(toml::from_str("[review]\ninclude_context = true\n").unwrap());
        assert!(base.review.include_context());

        // A layer that does not mention it leaves the setting alone.
        base.review.include_context = Some(false);
        base.merge(Config::default());
        assert!(!base.review.include_context());
    }

    #[test]
    fn merge_keeps_base_when_other_is_default() {
        let mut base = Config::default();
        base.provider.name = "openai".to_string();
        base.chunking.max_chunk_size = 1234;
        base.review.fail_on = Some(Severity::Warning);

        base.merge(Config::default());

        assert_eq!(base.provider.name, "openai");
        assert_eq!(base.chunking.max_chunk_size, 1234);
        assert_eq!(base.review.fail_on, Some(Severity::Warning));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.chunking.max_chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.review.max_concurrent_files = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chunking.max_chunk_size = 200;
        config.chunking.overlap = 200;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("chunking.overlap"), "got: {err}");
        config.chunking.overlap = 199;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.provider.name = "nope".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("nope"), "got: {err}");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..ProviderConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let result = Config::load_file(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let result = Config::load_file(Path::new("/tmp/patchline_not_exist_config.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read"));
    }

    #[test]
    fn load_from_repo_root() {
        let env = Env::mock(Vec::<(&str, &str)>::new());

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".patchline.toml"),
            r#"
[chunking]
max_chunk_size = 4096

[provider]
name = "gemini"
"#,
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), &env).unwrap();
        assert_eq!(config.provider.name, "gemini");
        assert_eq!(config.chunking.max_chunk_size, 4096);
    }

    #[test]
    fn global_config_path_mentions_app_dir() {
        if let Some(p) = Config::global_config_path() {
            assert!(p.to_str().unwrap().contains("patchline"));
        }
    }

    #[test]
    fn apply_env_vars_provider_and_api_key() {
        let env = Env::mock([
            ("PATCHLINE_PROVIDER", "openai"),
            ("PATCHLINE_API_KEY", "sk-env-test"),
            ("PATCHLINE_COMMAND", "review.sh"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env-test"));
        assert_eq!(config.provider.command.as_deref(), Some("review.sh"));
    }

    #[test]
    fn apply_env_vars_provider_specific_api_key_fallback() {
        let env = Env::mock([("ANTHROPIC_API_KEY", "sk-anthropic-test")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-anthropic-test"));
    }

    #[test]
    fn apply_env_vars_numbers_and_line_target() {
        let env = Env::mock([
            ("PATCHLINE_MAX_CHUNK_SIZE", "2048"),
            ("PATCHLINE_OVERLAP", "64"),
            ("PATCHLINE_CONCURRENCY", "2"),
            ("PATCHLINE_LINE_TARGET", "Modified"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.chunking.max_chunk_size, 2048);
        assert_eq!(config.chunking.overlap, 64);
        assert_eq!(config.review.max_concurrent_files, 2);
        assert_eq!(config.review.line_target, LineTarget::Modified);
    }

    #[test]
    fn apply_env_vars_invalid_values_ignored() {
        let env = Env::mock([
            ("PATCHLINE_PROVIDER", "not-a-provider"),
            ("PATCHLINE_MAX_CHUNK_SIZE", "0"),
            ("PATCHLINE_CONCURRENCY", "many"),
            ("PATCHLINE_LINE_TARGET", "sideways"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, "anthropic");
        assert_eq!(config.chunking.max_chunk_size, ChunkOptions::default().max_chunk_size);
        assert_eq!(config.review.max_concurrent_files, DEFAULT_MAX_CONCURRENT_FILES);
        assert_eq!(config.review.line_target, LineTarget::Original);
    }
}
