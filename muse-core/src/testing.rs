//! Testing utilities for story sessions.
//!
//! This module provides tools for integration testing:
//! - `MockGenerator` for deterministic testing without API calls
//! - `TestHarness` for scripted session scenarios
//! - Assertion helpers for verifying session state

use crate::generator::{GenerationError, StoryGenerator, SILENT_MUSES_MESSAGE};
use crate::params::{ParamField, StoryLength, StoryParams};
use crate::session::{GenerationTask, Phase, SessionState, StorySession, SubmitRejected};
use crate::story::GeneratedStory;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A scripted outcome for the mock generator.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this story.
    Story(GeneratedStory),
    /// Treat this text as the model's raw output and parse it like the real
    /// generator does.
    RawJson(String),
    /// Fail as if the transport did, with this cause.
    Failure(String),
}

impl MockOutcome {
    pub fn story(title: impl Into<String>, content: impl Into<String>) -> Self {
        MockOutcome::Story(GeneratedStory::new(title, content))
    }

    pub fn raw_json(text: impl Into<String>) -> Self {
        MockOutcome::RawJson(text.into())
    }

    pub fn failure(cause: impl Into<String>) -> Self {
        MockOutcome::Failure(cause.into())
    }
}

/// A generator that returns scripted outcomes in order.
///
/// Use this for deterministic tests without API calls. When the script runs
/// out every further call fails.
#[derive(Debug, Default)]
pub struct MockGenerator {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    requests: Mutex<Vec<StoryParams>>,
    calls: AtomicUsize,
}

impl MockGenerator {
    /// Create a new mock generator with scripted outcomes.
    pub fn new(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Add an outcome to the queue.
    pub fn queue(&self, outcome: MockOutcome) {
        lock(&self.outcomes).push_back(outcome);
    }

    /// Number of generate calls that actually ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Parameters of every call, in order.
    pub fn requests(&self) -> Vec<StoryParams> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl StoryGenerator for MockGenerator {
    async fn generate(&self, params: StoryParams) -> Result<GeneratedStory, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(params);

        let outcome = lock(&self.outcomes).pop_front();
        match outcome {
            Some(MockOutcome::Story(story)) => Ok(story),
            Some(MockOutcome::RawJson(text)) => {
                GeneratedStory::from_json(&text).map_err(GenerationError::from_cause)
            }
            Some(MockOutcome::Failure(cause)) => Err(GenerationError::from_cause(cause)),
            None => Err(GenerationError::from_cause("mock generator has no scripted outcomes")),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parameters that pass the submit guard.
pub fn sample_params() -> StoryParams {
    StoryParams {
        genre: "Fantasy".to_string(),
        character_name: "Ayesha".to_string(),
        setting: "Mars Colony, 2077".to_string(),
        tone: "Hopeful".to_string(),
        length: StoryLength::Short,
    }
}

/// Test harness for running session scenarios.
pub struct TestHarness {
    /// The session under test.
    pub session: StorySession<MockGenerator>,
}

impl TestHarness {
    /// Create a harness whose parameters are ready to submit.
    pub fn new() -> Self {
        Self::with_params(sample_params())
    }

    /// Create a harness with custom parameters.
    pub fn with_params(params: StoryParams) -> Self {
        Self {
            session: StorySession::with_params(MockGenerator::default(), params),
        }
    }

    /// Queue a story response.
    pub fn expect_story(&mut self, title: &str, content: &str) -> &mut Self {
        self.session.generator().queue(MockOutcome::story(title, content));
        self
    }

    /// Queue raw model output.
    pub fn expect_raw(&mut self, text: &str) -> &mut Self {
        self.session.generator().queue(MockOutcome::raw_json(text));
        self
    }

    /// Queue a failure.
    pub fn expect_failure(&mut self, cause: &str) -> &mut Self {
        self.session.generator().queue(MockOutcome::failure(cause));
        self
    }

    /// Set a parameter; panics on invalid input.
    pub fn set(&mut self, field: ParamField, value: &str) -> &mut Self {
        if let Err(e) = self.session.set_field(field, value) {
            panic!("invalid test parameter {field}={value:?}: {e}");
        }
        self
    }

    pub fn submit(&mut self) -> Result<GenerationTask, SubmitRejected> {
        self.session.submit()
    }

    pub async fn finish(&mut self) -> &SessionState {
        self.session.finish().await
    }

    /// Submit and finish in one step.
    pub async fn generate(&mut self) -> Result<&SessionState, SubmitRejected> {
        self.session.generate().await
    }

    pub fn reset(&mut self) {
        if let Err(e) = self.session.reset() {
            panic!("reset failed: {e}");
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Number of requests that reached the generator.
    pub fn calls(&self) -> usize {
        self.session.generator().calls()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the session is idle with nothing stored.
#[track_caller]
pub fn assert_idle(harness: &TestHarness) {
    assert_eq!(
        harness.session.state(),
        &SessionState::Idle,
        "Expected IDLE, got {}",
        harness.phase()
    );
}

/// Assert the session holds a story with the given title.
#[track_caller]
pub fn assert_story_title(harness: &TestHarness, title: &str) {
    match harness.session.story() {
        Some(story) => assert_eq!(story.title, title, "Unexpected story title"),
        None => panic!("Expected SUCCESS with '{title}', got {}", harness.phase()),
    }
    assert!(harness.session.error().is_none(), "Story and error both set");
}

/// Assert the session failed with the generic message and holds no story.
#[track_caller]
pub fn assert_silent_muses(harness: &TestHarness) {
    assert_eq!(
        harness.session.error(),
        Some(SILENT_MUSES_MESSAGE),
        "Expected ERROR, got {}",
        harness.phase()
    );
    assert!(harness.session.story().is_none(), "Story stored after failure");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_scripted_outcomes_in_order() {
        let mock = MockGenerator::new(vec![
            MockOutcome::story("One", "First"),
            MockOutcome::failure("boom"),
        ]);

        let first = mock.generate(sample_params()).await.unwrap();
        assert_eq!(first.title, "One");
        assert!(mock.generate(sample_params()).await.is_err());
        assert!(mock.generate(sample_params()).await.is_err());
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_parses_raw_json() {
        let mock = MockGenerator::new(vec![
            MockOutcome::raw_json(r#"{"title": "Parsed", "content": "Body"}"#),
            MockOutcome::raw_json(r#"{"title": "Missing body"}"#),
        ]);

        assert_eq!(mock.generate(sample_params()).await.unwrap().title, "Parsed");
        assert!(mock.generate(sample_params()).await.is_err());
    }

    #[test]
    fn test_sample_params_are_ready() {
        assert!(sample_params().is_ready());
    }
}
