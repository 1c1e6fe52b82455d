//! MuseAI story generation engine.
//!
//! This crate provides:
//! - Story parameters with the suggested genre and tone catalogs
//! - A Gemini-backed story generator with schema-constrained JSON output
//! - A single-flight session state machine (Idle, Generating, Success, Error)
//! - Mock generators and a test harness for deterministic tests
//!
//! # Quick Start
//!
//! ```ignore
//! use muse_core::{SessionConfig, StorySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new()
//!         .with_character_name("Ayesha")
//!         .with_setting("Mars Colony, 2077");
//!
//!     let mut session = StorySession::from_env(config)?;
//!
//!     session.generate().await?;
//!     match session.story() {
//!         Some(story) => println!("{}\n\n{}", story.title, story.content),
//!         None => println!("{}", session.error().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod generator;
pub mod params;
pub mod session;
pub mod story;
pub mod testing;

// Primary public API
pub use generator::{
    GeminiGenerator, GenerationError, GeneratorConfig, StoryGenerator, SILENT_MUSES_MESSAGE,
};
pub use params::{ParamError, ParamField, StoryLength, StoryParams, GENRES, TONES};
pub use session::{
    GenerationTask, Phase, SessionConfig, SessionError, SessionEvent, SessionState, StorySession,
    SubmitRejected, TransitionError,
};
pub use story::GeneratedStory;
pub use testing::{MockGenerator, MockOutcome, TestHarness};
