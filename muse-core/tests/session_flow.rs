//! Scenario tests for the story session using the mock generator.
//!
//! These run without network access and cover the full lifecycle:
//! submit gating, single-flight, success, failure and reset.

use futures::FutureExt;
use muse_core::testing::{assert_idle, assert_silent_muses, assert_story_title, TestHarness};
use muse_core::{
    MockGenerator, MockOutcome, ParamField, Phase, SessionState, StoryLength, StoryParams,
    StorySession, SubmitRejected, SILENT_MUSES_MESSAGE,
};

// =============================================================================
// HAPPY PATH
// =============================================================================

#[tokio::test]
async fn test_red_sands_scenario() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "The dome hummed as Ayesha watched the storm.");

    let params = harness.session.params().clone();
    assert_eq!(params.genre, "Fantasy");
    assert_eq!(params.character_name, "Ayesha");
    assert_eq!(params.setting, "Mars Colony, 2077");
    assert_eq!(params.tone, "Hopeful");
    assert_eq!(params.length, StoryLength::Short);

    let state = harness.generate().await.expect("submit should be accepted");
    assert_eq!(state.phase(), Phase::Success);

    assert_story_title(&harness, "Red Sands");
    assert_eq!(harness.calls(), 1);
}

#[tokio::test]
async fn test_story_stored_verbatim_with_author_note() {
    let mut harness = TestHarness::new();
    harness.expect_raw(
        r#"{"title": "Red Sands", "content": "  Dust.  ", "authorNote": "Inspired by dawn on Mars."}"#,
    );

    harness.generate().await.unwrap();

    let story = harness.session.story().expect("story stored");
    assert_eq!(story.content, "  Dust.  ");
    assert_eq!(story.author_note.as_deref(), Some("Inspired by dawn on Mars."));
}

#[tokio::test]
async fn test_story_without_author_note() {
    let mut harness = TestHarness::new();
    harness.expect_raw(r#"{"title": "Red Sands", "content": "Dust."}"#);

    harness.generate().await.unwrap();

    assert_eq!(harness.session.story().unwrap().author_note, None);
}

#[tokio::test]
async fn test_generator_receives_current_params() {
    let mut harness = TestHarness::new();
    harness
        .set(ParamField::Genre, "Solarpunk")
        .set(ParamField::Tone, "Wistful")
        .set(ParamField::Length, "Long")
        .expect_story("Green Glass", "...");

    harness.generate().await.unwrap();

    let requests = harness.session.generator().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].genre, "Solarpunk");
    assert_eq!(requests[0].tone, "Wistful");
    assert_eq!(requests[0].length, StoryLength::Long);
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_network_failure_shows_generic_message() {
    let mut harness = TestHarness::new();
    harness.expect_failure("connection refused (os error 111)");

    let state = harness.generate().await.unwrap();
    assert_eq!(
        state,
        &SessionState::Error {
            message: SILENT_MUSES_MESSAGE.to_string()
        }
    );
    assert_silent_muses(&harness);
}

#[tokio::test]
async fn test_malformed_payloads_fail_without_story() {
    let payloads = [
        r#"{"title": "No body"}"#,
        r#"{"content": "No title"}"#,
        r#"{"title": ["Red"], "content": "Dust."}"#,
        r#"["Red Sands", "Dust rose."]"#,
        r#""Red Sands""#,
        "Once upon a time, on Mars...",
        "",
    ];

    for payload in payloads {
        let mut harness = TestHarness::new();
        harness.expect_raw(payload);

        harness.generate().await.unwrap();

        assert_silent_muses(&harness);
    }
}

#[tokio::test]
async fn test_resubmit_after_error() {
    let mut harness = TestHarness::new();
    harness
        .expect_failure("503 Service Unavailable")
        .expect_story("Second Wind", "It worked this time.");

    harness.generate().await.unwrap();
    assert_silent_muses(&harness);

    harness.generate().await.unwrap();
    assert_story_title(&harness, "Second Wind");
    assert_eq!(harness.calls(), 2);
}

// =============================================================================
// SUBMIT GATING
// =============================================================================

#[tokio::test]
async fn test_submit_rejected_when_required_fields_empty() {
    let mut harness = TestHarness::with_params(StoryParams::default());

    let rejected = harness.submit().unwrap_err();
    assert_eq!(
        rejected,
        SubmitRejected::MissingFields(vec![ParamField::CharacterName, ParamField::Setting])
    );
    assert_idle(&harness);

    harness.set(ParamField::CharacterName, "Ayesha");
    assert_eq!(
        harness.submit().unwrap_err(),
        SubmitRejected::MissingFields(vec![ParamField::Setting])
    );
    assert_idle(&harness);
    assert_eq!(harness.calls(), 0);
}

#[tokio::test]
async fn test_submit_rejected_after_field_cleared() {
    let mut harness = TestHarness::new();
    harness.expect_failure("timeout");
    harness.generate().await.unwrap();
    assert_eq!(harness.phase(), Phase::Error);

    harness.set(ParamField::Setting, "");
    assert!(matches!(
        harness.submit(),
        Err(SubmitRejected::MissingFields(_))
    ));
    assert_silent_muses(&harness);
}

#[tokio::test]
async fn test_second_submit_while_pending_is_ignored() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "...").expect_story("Unused", "...");

    harness.submit().expect("first submit accepted");
    assert_eq!(harness.phase(), Phase::Generating);

    assert_eq!(harness.submit().unwrap_err(), SubmitRejected::AlreadyGenerating);
    assert_eq!(harness.submit().unwrap_err(), SubmitRejected::AlreadyGenerating);
    assert_eq!(harness.phase(), Phase::Generating);

    harness.finish().await;

    assert_story_title(&harness, "Red Sands");
    assert_eq!(harness.calls(), 1);
}

#[tokio::test]
async fn test_reset_rejected_while_generating() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "...");

    harness.submit().unwrap();
    assert!(harness.session.reset().is_err());
    assert_eq!(harness.phase(), Phase::Generating);

    harness.finish().await;
    assert_story_title(&harness, "Red Sands");
}

#[tokio::test]
async fn test_params_snapshot_taken_at_submit() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "...");

    harness.submit().unwrap();
    harness.set(ParamField::CharacterName, "Silas Vane");
    harness.finish().await;

    let requests = harness.session.generator().requests();
    assert_eq!(requests[0].character_name, "Ayesha");
    assert_eq!(harness.session.params().character_name, "Silas Vane");
}

// =============================================================================
// RESET
// =============================================================================

#[tokio::test]
async fn test_reset_from_success_clears_story() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "...");
    harness.generate().await.unwrap();

    harness.reset();

    assert_idle(&harness);
    assert!(harness.session.story().is_none());
    assert!(harness.session.error().is_none());
    assert_eq!(harness.session.params().character_name, "Ayesha");
}

#[tokio::test]
async fn test_reset_from_error_clears_message() {
    let mut harness = TestHarness::new();
    harness.expect_failure("bad gateway");
    harness.generate().await.unwrap();

    harness.reset();

    assert_idle(&harness);
    assert!(harness.session.error().is_none());
}

#[tokio::test]
async fn test_new_submit_from_success_replaces_story() {
    let mut harness = TestHarness::new();
    harness
        .expect_story("Red Sands", "...")
        .expect_story("Blue Dusk", "...");

    harness.generate().await.unwrap();
    assert_story_title(&harness, "Red Sands");

    harness.submit().unwrap();
    assert!(harness.session.story().is_none());
    harness.finish().await;
    assert_story_title(&harness, "Blue Dusk");
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test]
async fn test_aborted_task_resolves_as_failure() {
    let mut harness = TestHarness::new();
    harness.expect_story("Never Seen", "...");

    let task = harness.submit().unwrap();
    task.abort();
    harness.finish().await;

    assert_silent_muses(&harness);
    assert_eq!(harness.calls(), 0);
}

#[tokio::test]
async fn test_dropped_task_handle_still_resolves() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "...");

    let task = harness.submit().unwrap();
    drop(task);
    assert_eq!(harness.phase(), Phase::Generating);

    harness.finish().await;

    assert_story_title(&harness, "Red Sands");
    assert_eq!(harness.calls(), 1);
    harness.reset();
    assert_idle(&harness);
}

#[tokio::test]
async fn test_cancelled_finish_can_be_resumed() {
    let mut harness = TestHarness::new();
    harness.expect_story("Red Sands", "...");

    harness.submit().unwrap();
    // Spawned request has not been polled yet on the test runtime.
    assert!(harness.finish().now_or_never().is_none());
    assert_eq!(harness.phase(), Phase::Generating);

    harness.finish().await;
    assert_story_title(&harness, "Red Sands");
    assert_eq!(harness.calls(), 1);
}

#[tokio::test]
async fn test_finish_without_submit_keeps_state() {
    let mut harness = TestHarness::new();

    harness.finish().await;

    assert_idle(&harness);
    assert_eq!(harness.calls(), 0);
}

#[tokio::test]
async fn test_save_story_writes_markdown() {
    let generator = MockGenerator::new(vec![MockOutcome::story("Red Sands", "Dust rose.")]);
    let mut session = StorySession::with_params(generator, muse_core::testing::sample_params());
    session.generate().await.unwrap();

    let path = std::env::temp_dir().join(format!("muse-story-{}.md", session.id()));
    session.save_story(&path).await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert!(written.starts_with("# Red Sands"));
    assert!(written.contains("Dust rose."));
}

#[tokio::test]
async fn test_save_without_story_fails() {
    let session = StorySession::new(MockGenerator::default());
    let path = std::env::temp_dir().join("muse-never-written.md");
    assert!(matches!(
        session.save_story(&path).await,
        Err(muse_core::SessionError::NoStory)
    ));
}
