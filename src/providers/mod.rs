//! ReviewProvider trait and the AI review capability boundary.
//!
//! The orchestrator only sees [`ReviewProvider`]; how a backend is reached
//! is up to the implementation.

pub mod command;
pub mod registry;
pub mod response;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::comment::ReviewComment;

/// Errors from the review provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("review backend error: {0}")]
    ApiError(String),

    #[error("review backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Opaque AI review capability.
///
/// Returns comments whose `line_number` is local to `text` (1-based).
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn review_code(
        &self,
        text: &str,
        language: &str,
        persona: &str,
        context: &str,
    ) -> Result<Vec<ReviewComment>, ProviderError>;
}
