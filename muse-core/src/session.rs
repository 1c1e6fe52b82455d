//! StorySession - the primary public API for story generation.
//!
//! A session owns the story parameters, the current [`SessionState`] and
//! the generator. State changes go through [`SessionState::transition`], a
//! pure function of (state, event), so invalid combinations such as a story
//! and an error at the same time cannot be represented.
//!
//! Generation is single-flight: [`StorySession::submit`] moves the session
//! into `Generating`, spawns the request, and every further submit is
//! rejected until [`StorySession::finish`] has recorded the outcome.

use crate::generator::{GeminiGenerator, GenerationError, GeneratorConfig, StoryGenerator};
use crate::params::{ParamError, ParamField, StoryParams};
use crate::story::GeneratedStory;
use futures::future::{AbortHandle, Abortable, Aborted};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Errors from StorySession operations outside the generation lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No API key configured - set GEMINI_API_KEY (or API_KEY)")]
    NoApiKey,

    #[error("Gemini client error: {0}")]
    Gemini(gemini::Error),

    #[error("No story to save")]
    NoStory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<gemini::Error> for SessionError {
    fn from(err: gemini::Error) -> Self {
        match err {
            gemini::Error::NoApiKey => SessionError::NoApiKey,
            other => SessionError::Gemini(other),
        }
    }
}

/// Why a submit was refused. A refused submit changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("Missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<ParamField>),

    #[error("A story is already being generated")]
    AlreadyGenerating,
}

fn join_fields(fields: &[ParamField]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// An event that was not valid in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("A story is already being generated")]
    AlreadyGenerating,

    #[error("No generation is in progress")]
    NotGenerating,

    #[error("Cannot reset while a story is being generated")]
    ResetWhileGenerating,
}

/// Inputs to the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Submit,
    Succeeded(GeneratedStory),
    Failed(String),
    Reset,
}

/// The session's current state with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Generating,
    Success { story: GeneratedStory },
    Error { message: String },
}

/// Payload-free view of [`SessionState`], for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Generating,
    Success,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "IDLE",
            Phase::Generating => "GENERATING",
            Phase::Success => "SUCCESS",
            Phase::Error => "ERROR",
        };
        f.write_str(name)
    }
}

impl SessionState {
    /// Compute the state that `event` leads to, without changing `self`.
    ///
    /// - Submit: from anything but `Generating`; clears story and error.
    /// - Succeeded / Failed: only from `Generating`.
    /// - Reset: from anything but `Generating`; `Idle` stays `Idle`.
    pub fn transition(&self, event: SessionEvent) -> Result<SessionState, TransitionError> {
        match (self, event) {
            (SessionState::Generating, SessionEvent::Submit) => {
                Err(TransitionError::AlreadyGenerating)
            }
            (_, SessionEvent::Submit) => Ok(SessionState::Generating),
            (SessionState::Generating, SessionEvent::Succeeded(story)) => {
                Ok(SessionState::Success { story })
            }
            (SessionState::Generating, SessionEvent::Failed(message)) => {
                Ok(SessionState::Error { message })
            }
            (_, SessionEvent::Succeeded(_) | SessionEvent::Failed(_)) => {
                Err(TransitionError::NotGenerating)
            }
            (SessionState::Generating, SessionEvent::Reset) => {
                Err(TransitionError::ResetWhileGenerating)
            }
            (_, SessionEvent::Reset) => Ok(SessionState::Idle),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Generating => Phase::Generating,
            SessionState::Success { .. } => Phase::Success,
            SessionState::Error { .. } => Phase::Error,
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, SessionState::Generating)
    }

    /// The story, when in `Success`.
    pub fn story(&self) -> Option<&GeneratedStory> {
        match self {
            SessionState::Success { story } => Some(story),
            _ => None,
        }
    }

    /// The error message, when in `Error`.
    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::Error { message } => Some(message),
            _ => None,
        }
    }
}

type GenerationOutcome = Result<Result<GeneratedStory, GenerationError>, Aborted>;

/// Handle to the generation started by [`StorySession::submit`].
///
/// The request is already running on the Tokio runtime; the session keeps
/// its join handle, so dropping this value does not lose the outcome.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    attempt: u64,
    abort: AbortHandle,
}

impl GenerationTask {
    /// Sequence number of this attempt within its session.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Handle that can cancel the request from elsewhere.
    ///
    /// A cancelled task finishes like any other failure.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }
}

struct InFlight {
    attempt: u64,
    handle: JoinHandle<GenerationOutcome>,
}

/// Configuration for creating a new session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Initial story parameters.
    pub params: StoryParams,

    /// Generator settings (model, temperature, ...).
    pub generator: GeneratorConfig,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: StoryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.params.genre = genre.into();
        self
    }

    pub fn with_character_name(mut self, name: impl Into<String>) -> Self {
        self.params.character_name = name.into();
        self
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.params.setting = setting.into();
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.params.tone = tone.into();
        self
    }

    pub fn with_length(mut self, length: crate::params::StoryLength) -> Self {
        self.params.length = length;
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }
}

/// A story generation session.
pub struct StorySession<G> {
    id: Uuid,
    params: StoryParams,
    state: SessionState,
    attempt: u64,
    in_flight: Option<InFlight>,
    generator: Arc<G>,
}

impl StorySession<GeminiGenerator> {
    /// Create a Gemini-backed session.
    ///
    /// Requires `GEMINI_API_KEY` (or `API_KEY`) to be set.
    pub fn from_env(config: SessionConfig) -> Result<Self, SessionError> {
        let generator = GeminiGenerator::from_env()?.with_config(config.generator);
        Ok(Self::with_params(generator, config.params))
    }
}

impl<G: StoryGenerator + 'static> StorySession<G> {
    /// Create a session with default parameters.
    pub fn new(generator: G) -> Self {
        Self::with_params(generator, StoryParams::default())
    }

    /// Create a session with initial parameters.
    pub fn with_params(generator: G, params: StoryParams) -> Self {
        Self::from_shared(Arc::new(generator), params)
    }

    /// Create a session around a generator shared with other sessions.
    pub fn from_shared(generator: Arc<G>, params: StoryParams) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "story session created");
        Self {
            id,
            params,
            state: SessionState::Idle,
            attempt: 0,
            in_flight: None,
            generator,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current story parameters.
    pub fn params(&self) -> &StoryParams {
        &self.params
    }

    /// Replace one parameter. Allowed in every state; a running generation
    /// keeps the parameters it was submitted with.
    pub fn set_field(&mut self, field: ParamField, value: impl Into<String>) -> Result<(), ParamError> {
        self.params.set_field(field, value)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_generating(&self) -> bool {
        self.state.is_generating()
    }

    pub fn story(&self) -> Option<&GeneratedStory> {
        self.state.story()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Start generating a story from the current parameters.
    ///
    /// Rejected without any state change while a generation is running or
    /// while the character name or setting is empty. On success the request
    /// is spawned onto the current Tokio runtime, which must exist.
    pub fn submit(&mut self) -> Result<GenerationTask, SubmitRejected> {
        if self.state.is_generating() {
            tracing::debug!(session = %self.id, "submit ignored: already generating");
            return Err(SubmitRejected::AlreadyGenerating);
        }

        let missing = self.params.missing_fields();
        if !missing.is_empty() {
            return Err(SubmitRejected::MissingFields(missing));
        }

        self.apply(SessionEvent::Submit)
            .map_err(|_| SubmitRejected::AlreadyGenerating)?;
        self.attempt += 1;

        let generator = Arc::clone(&self.generator);
        let params = self.params.clone();
        let (abort, registration) = AbortHandle::new_pair();
        let handle = tokio::spawn(Abortable::new(
            async move { generator.generate(params).await },
            registration,
        ));

        self.in_flight = Some(InFlight {
            attempt: self.attempt,
            handle,
        });

        Ok(GenerationTask {
            attempt: self.attempt,
            abort,
        })
    }

    /// Wait for the running generation and record its outcome.
    ///
    /// Returns the current state unchanged when nothing is running. If this
    /// future is dropped before completing, the request keeps running and a
    /// later call picks up its outcome.
    pub async fn finish(&mut self) -> &SessionState {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return &self.state;
        };

        let joined = (&mut in_flight.handle).await;
        let attempt = in_flight.attempt;
        self.in_flight = None;

        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(aborted)) => Err(GenerationError::from_cause(aborted)),
            Err(join_error) => Err(GenerationError::from_cause(join_error)),
        };
        self.resolve(attempt, outcome)
    }

    /// Submit and finish in one step.
    pub async fn generate(&mut self) -> Result<&SessionState, SubmitRejected> {
        self.submit()?;
        Ok(self.finish().await)
    }

    /// Go back to `Idle`, clearing any story or error. Parameters are kept.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.apply(SessionEvent::Reset)
    }

    /// Save the current story as Markdown.
    pub async fn save_story(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let story = self.story().ok_or(SessionError::NoStory)?;
        fs::write(path, story.to_markdown()).await?;
        Ok(())
    }

    fn resolve(
        &mut self,
        attempt: u64,
        outcome: Result<GeneratedStory, GenerationError>,
    ) -> &SessionState {
        if attempt != self.attempt {
            tracing::warn!(
                session = %self.id,
                attempt,
                current = self.attempt,
                "ignoring outcome of a stale generation"
            );
            return &self.state;
        }

        let event = match outcome {
            Ok(story) => SessionEvent::Succeeded(story),
            Err(err) => SessionEvent::Failed(err.message().to_string()),
        };

        if let Err(err) = self.apply(event) {
            tracing::warn!(session = %self.id, error = %err, "generation outcome dropped");
        }
        &self.state
    }

    fn apply(&mut self, event: SessionEvent) -> Result<(), TransitionError> {
        let next = self.state.transition(event)?;
        tracing::info!(
            session = %self.id,
            from = %self.state.phase(),
            to = %next.phase(),
            "session transition"
        );
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::SILENT_MUSES_MESSAGE;

    fn story() -> GeneratedStory {
        GeneratedStory::new("Red Sands", "Dust rose over the dome.")
    }

    #[test]
    fn test_submit_transitions() {
        assert_eq!(
            SessionState::Idle.transition(SessionEvent::Submit),
            Ok(SessionState::Generating)
        );
        let error = SessionState::Error {
            message: SILENT_MUSES_MESSAGE.to_string(),
        };
        assert_eq!(
            error.transition(SessionEvent::Submit),
            Ok(SessionState::Generating)
        );
        let success = SessionState::Success { story: story() };
        assert_eq!(
            success.transition(SessionEvent::Submit),
            Ok(SessionState::Generating)
        );
        assert_eq!(
            SessionState::Generating.transition(SessionEvent::Submit),
            Err(TransitionError::AlreadyGenerating)
        );
    }

    #[test]
    fn test_resolution_transitions() {
        let next = SessionState::Generating
            .transition(SessionEvent::Succeeded(story()))
            .unwrap();
        assert_eq!(next.story(), Some(&story()));
        assert_eq!(next.error(), None);

        let next = SessionState::Generating
            .transition(SessionEvent::Failed(SILENT_MUSES_MESSAGE.to_string()))
            .unwrap();
        assert_eq!(next.error(), Some(SILENT_MUSES_MESSAGE));
        assert_eq!(next.story(), None);
    }

    #[test]
    fn test_resolution_requires_generating() {
        assert_eq!(
            SessionState::Idle.transition(SessionEvent::Succeeded(story())),
            Err(TransitionError::NotGenerating)
        );
        let success = SessionState::Success { story: story() };
        assert_eq!(
            success.transition(SessionEvent::Failed("late".to_string())),
            Err(TransitionError::NotGenerating)
        );
    }

    #[test]
    fn test_reset_transitions() {
        let success = SessionState::Success { story: story() };
        assert_eq!(success.transition(SessionEvent::Reset), Ok(SessionState::Idle));

        let error = SessionState::Error {
            message: "x".to_string(),
        };
        assert_eq!(error.transition(SessionEvent::Reset), Ok(SessionState::Idle));
        assert_eq!(
            SessionState::Idle.transition(SessionEvent::Reset),
            Ok(SessionState::Idle)
        );
        assert_eq!(
            SessionState::Generating.transition(SessionEvent::Reset),
            Err(TransitionError::ResetWhileGenerating)
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionState::Idle.phase().to_string(), "IDLE");
        assert_eq!(SessionState::Generating.phase().to_string(), "GENERATING");
        assert_eq!(
            SessionState::Success { story: story() }.phase(),
            Phase::Success
        );
    }

    #[test]
    fn test_submit_rejected_display() {
        let err = SubmitRejected::MissingFields(vec![ParamField::CharacterName, ParamField::Setting]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: characterName, setting"
        );
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new()
            .with_genre("Horror")
            .with_character_name("Silas Vane")
            .with_setting("Abandoned hospital at night")
            .with_tone("Scary")
            .with_length(crate::params::StoryLength::Long);

        assert_eq!(config.params.genre, "Horror");
        assert_eq!(config.params.character_name, "Silas Vane");
        assert!(config.params.is_ready());
    }

    #[test]
    fn test_no_api_key_maps_to_session_error() {
        let err: SessionError = gemini::Error::NoApiKey.into();
        assert!(matches!(err, SessionError::NoApiKey));
    }
}
