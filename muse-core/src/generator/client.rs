//! Gemini-backed story generator.

use super::prompts::{story_prompt, story_schema, system_instruction};
use super::{GenerationError, StoryGenerator};
use crate::params::StoryParams;
use crate::story::GeneratedStory;
use async_trait::async_trait;
use gemini::{Content, FinishReason, Gemini, Request};
use thiserror::Error;

/// Root cause of a failed generation. Logged, never returned.
#[derive(Debug, Error)]
enum GenerationFailure {
    #[error("Gemini request failed: {0}")]
    Gemini(#[from] gemini::Error),

    #[error("Response did not match the story schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Configuration for the generator.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// The model to use (defaults to the client's model).
    pub model: Option<String>,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Cap on output tokens.
    pub max_output_tokens: Option<usize>,

    /// Replaces the built-in MuseAI system instruction.
    pub custom_system_instruction: Option<String>,
}

impl GeneratorConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: usize) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.custom_system_instruction = Some(instruction.into());
        self
    }
}

/// Generates stories with Gemini's schema-constrained JSON output.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Gemini,
    config: GeneratorConfig,
}

impl GeminiGenerator {
    /// Create a generator with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Gemini::new(api_key))
    }

    /// Create a generator from `GEMINI_API_KEY` (or `API_KEY`).
    pub fn from_env() -> Result<Self, gemini::Error> {
        Ok(Self::with_client(Gemini::from_env()?))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Gemini) -> Self {
        Self {
            client,
            config: GeneratorConfig::default(),
        }
    }

    /// Configure the generator.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The model requests will be sent to.
    pub fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(self.client.model())
    }

    fn build_request(&self, params: &StoryParams) -> Request {
        let system = self
            .config
            .custom_system_instruction
            .clone()
            .unwrap_or_else(system_instruction);

        let mut request = Request::new(vec![Content::user(story_prompt(params))])
            .with_system(system)
            .with_json_schema(story_schema());

        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        if let Some(tokens) = self.config.max_output_tokens {
            request = request.with_max_output_tokens(tokens);
        }

        request
    }

    async fn try_generate(&self, params: &StoryParams) -> Result<GeneratedStory, GenerationFailure> {
        let request = self.build_request(params);
        let response = self.client.generate_content(request).await?;

        let finish_reason = response.finish_reason();
        tracing::debug!(
            total_tokens = response.usage.total_tokens,
            finish_reason = ?finish_reason,
            "story response received"
        );
        if finish_reason == Some(FinishReason::MaxTokens) {
            tracing::warn!("story output hit the token limit and may be truncated");
        }

        let text = response.into_text()?;
        Ok(GeneratedStory::from_json(&text)?)
    }
}

#[async_trait]
impl StoryGenerator for GeminiGenerator {
    async fn generate(&self, params: StoryParams) -> Result<GeneratedStory, GenerationError> {
        tracing::debug!(
            model = %self.model(),
            genre = %params.genre,
            length = %params.length,
            "generating story"
        );
        self.try_generate(&params)
            .await
            .map_err(GenerationError::from_cause)
    }
}
