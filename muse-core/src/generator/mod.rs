//! Story generation.
//!
//! The [`StoryGenerator`] trait is the seam between the session and the
//! model. [`GeminiGenerator`] is the production implementation; tests use
//! [`crate::testing::MockGenerator`].

mod client;
pub mod prompts;

pub use client::{GeminiGenerator, GeneratorConfig};

use crate::params::StoryParams;
use crate::story::GeneratedStory;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// The only message a failed generation ever shows.
pub const SILENT_MUSES_MESSAGE: &str =
    "The muses are silent right now. Please try again in a moment.";

/// A failed generation.
///
/// Opaque: every cause (network, provider, malformed JSON,
/// schema mismatch) collapses into the same user-facing message. The cause
/// is logged when the error is created and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", SILENT_MUSES_MESSAGE)]
pub struct GenerationError {
    _private: (),
}

impl GenerationError {
    /// Log `cause` and hide it behind the generic error.
    pub fn from_cause(cause: impl fmt::Display) -> Self {
        tracing::error!(cause = %cause, "story generation failed");
        Self { _private: () }
    }

    /// The user-facing message.
    pub fn message(&self) -> &'static str {
        SILENT_MUSES_MESSAGE
    }
}

/// Anything that can turn story parameters into a story.
///
/// Implementations make a single attempt: no retries, no caching. Callers
/// are responsible for checking [`StoryParams::is_ready`] first.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate(&self, params: StoryParams) -> Result<GeneratedStory, GenerationError>;
}
