//! Review provider backed by an external command.
//!
//! The command runs through `sh -c` in the repository root. It receives a
//! JSON review request on stdin and must print the review on stdout; the
//! output goes through the forgiving response parser. Provider name,
//! model, base URL and API key are passed as environment variables so the
//! command can reach whichever backend the registry describes.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::config::ProviderConfig;
use crate::models::comment::ReviewComment;

use super::registry::{self, ProviderSpec};
use super::response::parse_review_response;
use super::{ProviderError, ReviewProvider};

/// Maximum length of stderr included in error messages.
const STDERR_PREVIEW_LEN: usize = 2000;

/// Request envelope written to the command's stdin.
#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    language: &'a str,
    persona: &'a str,
    context: &'a str,
    code: &'a str,
}

/// Runs a shell command per review call.
pub struct CommandProvider {
    command: String,
    repo_root: PathBuf,
    timeout: Duration,
    spec: &'static ProviderSpec,
    model: String,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl CommandProvider {
    /// Build a provider from config.
    ///
    /// Fails when no command is configured or the provider name is not in
    /// the registry.
    pub fn from_config(config: &ProviderConfig, repo_root: PathBuf) -> Result<Self, ProviderError> {
        let command = config
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(
                    "no review command set (use --command or [provider] command)".into(),
                )
            })?
            .to_string();

        let spec = registry::lookup(&config.name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{}' (known: {})",
                config.name,
                registry::known_names()
            ))
        })?;

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| spec.default_model.to_string());
        let base_url = config
            .base_url
            .clone()
            .or_else(|| spec.base_url.map(str::to_string));

        Ok(Self {
            command,
            repo_root,
            timeout: Duration::from_secs(config.timeout_secs),
            spec,
            model,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model the command will be told to use.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn run(&self, input: &[u8]) -> Result<String, ProviderError> {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .current_dir(&self.repo_root)
            .env("PATCHLINE_PROVIDER", self.spec.name)
            .env("PATCHLINE_MODEL", &self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(url) = &self.base_url {
            cmd.env("PATCHLINE_BASE_URL", url);
        }
        if let Some(key) = &self.api_key {
            cmd.env(self.spec.api_key_env, key);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ProviderError::ApiError(format!("failed to execute command: {e}")))?;

        // Write stdin concurrently so a command that streams output while
        // reading cannot fill its stdout pipe and stall.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.to_vec();
            tokio::spawn(async move { stdin.write_all(&input).await })
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
            .map_err(|e| ProviderError::ApiError(format!("failed to execute command: {e}")))?;

        if let Some(writer) = writer {
            // The command may exit without reading its input.
            if let Ok(Err(e)) = writer.await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(ProviderError::ApiError(format!(
                        "failed to write review request: {e}"
                    )));
                }
            }
        }

        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.len() > STDERR_PREVIEW_LEN {
                let cut = (0..=STDERR_PREVIEW_LEN)
                    .rev()
                    .find(|&i| stderr.is_char_boundary(i))
                    .unwrap_or(0);
                stderr.truncate(cut);
                stderr.push_str("...");
            }
            return Err(ProviderError::ApiError(format!(
                "review command failed ({}): {stderr}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ReviewProvider for CommandProvider {
    async fn review_code(
        &self,
        text: &str,
        language: &str,
        persona: &str,
        context: &str,
    ) -> Result<Vec<ReviewComment>, ProviderError> {
        let request = ReviewRequest {
            language,
            persona,
            context,
            code: text,
        };
        let input = serde_json::to_vec(&request)
            .map_err(|e| ProviderError::ApiError(format!("failed to encode request: {e}")))?;

        tracing::debug!(
            provider = self.spec.name,
            model = %self.model,
            bytes = input.len(),
            "running review command"
        );
        let stdout = self.run(&input).await?;
        Ok(parse_review_response(&stdout).into_comments())
    }
}
