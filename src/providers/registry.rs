//! Known AI backends as a lookup table.
//!
//! Adding a backend means adding a row here; nothing else branches on the
//! provider name.

use serde::Serialize;

/// Static description of one AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderSpec {
    /// Name used in config and on the command line.
    pub name: &'static str,
    /// Environment variable conventionally holding the API key.
    pub api_key_env: &'static str,
    /// Model used when none is configured.
    pub default_model: &'static str,
    /// API base URL, when the backend has a fixed one.
    pub base_url: Option<&'static str>,
}

/// Default provider name.
pub const DEFAULT_PROVIDER: &str = "anthropic";

pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "anthropic",
        api_key_env: "ANTHROPIC_API_KEY",
        default_model: "claude-sonnet-4-20250514",
        base_url: Some("https://api.anthropic.com"),
    },
    ProviderSpec {
        name: "openai",
        api_key_env: "OPENAI_API_KEY",
        default_model: "gpt-4o",
        base_url: Some("https://api.openai.com/v1"),
    },
    ProviderSpec {
        name: "gemini",
        api_key_env: "GEMINI_API_KEY",
        default_model: "gemini-2.5-pro",
        base_url: Some("https://generativelanguage.googleapis.com"),
    },
    ProviderSpec {
        name: "deepseek",
        api_key_env: "DEEPSEEK_API_KEY",
        default_model: "deepseek-chat",
        base_url: Some("https://api.deepseek.com"),
    },
    ProviderSpec {
        name: "groq",
        api_key_env: "GROQ_API_KEY",
        default_model: "llama-3.3-70b-versatile",
        base_url: Some("https://api.groq.com/openai/v1"),
    },
    // Any OpenAI-compatible server (Ollama, vLLM, ...); base URL comes from config.
    ProviderSpec {
        name: "openai-compatible",
        api_key_env: "OPENAI_API_KEY",
        default_model: "llama3",
        base_url: None,
    },
];

/// Look up a provider by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Comma-separated list of known provider names, for error messages.
pub fn known_names() -> String {
    PROVIDERS.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
}
