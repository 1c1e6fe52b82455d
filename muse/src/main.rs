//! MuseAI story generator CLI.
//!
//! Draft a story concept, send it to Gemini and read the result in the
//! terminal.
//!
//! # Modes
//!
//! Interactive (default): a line-oriented protocol on stdin, see `#help`.
//!
//! One-shot: pass `--once` with the required fields to generate a single
//! story and exit:
//!
//! ```bash
//! cargo run -p muse -- --once --character Ayesha --setting "Mars Colony, 2077" --length short
//! ```
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY` (or `API_KEY`): Gemini API key, also read from `.env`
//! - `MUSE_MODEL`: model name
//! - `MUSE_GENRE`, `MUSE_TONE`, `MUSE_LENGTH`: starting parameters
//! - `RUST_LOG`: log filter (logs go to stderr)

mod headless;

use anyhow::{bail, Context, Result};
use clap::Parser;
use muse_core::{GeneratorConfig, SessionConfig, SessionError, StoryLength, StorySession};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// MuseAI - intelligent storyteller
#[derive(Parser, Debug)]
#[command(name = "muse")]
#[command(version, about, long_about = None)]
struct Args {
    /// Story genre (Fantasy, Horror, Romance, Sci-Fi, ... or anything else)
    #[arg(long, env = "MUSE_GENRE")]
    genre: Option<String>,

    /// Main character's name
    #[arg(long)]
    character: Option<String>,

    /// Where and when the story takes place
    #[arg(long)]
    setting: Option<String>,

    /// Story tone (Dark, Funny, Hopeful, ... or anything else)
    #[arg(long, env = "MUSE_TONE")]
    tone: Option<String>,

    /// Story length: short, medium or long
    #[arg(long, env = "MUSE_LENGTH")]
    length: Option<StoryLength>,

    /// Gemini model to use
    #[arg(long, env = "MUSE_MODEL")]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Generate one story from the flags and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new();
        if let Some(genre) = &self.genre {
            config = config.with_genre(genre);
        }
        if let Some(character) = &self.character {
            config = config.with_character_name(character);
        }
        if let Some(setting) = &self.setting {
            config = config.with_setting(setting);
        }
        if let Some(tone) = &self.tone {
            config = config.with_tone(tone);
        }
        if let Some(length) = self.length {
            config = config.with_length(length);
        }

        let mut generator = GeneratorConfig::default();
        if let Some(model) = &self.model {
            generator = generator.with_model(model);
        }
        if let Some(temperature) = self.temperature {
            generator = generator.with_temperature(temperature);
        }
        config.with_generator(generator)
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.debug);

    let session = match StorySession::from_env(args.session_config()) {
        Ok(session) => session,
        Err(SessionError::NoApiKey) => {
            eprintln!("Error: GEMINI_API_KEY environment variable not set.");
            eprintln!("Please set it in .env file or with: export GEMINI_API_KEY=your_key_here");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to create story session"),
    };

    info!(
        session = %session.id(),
        model = session.generator().model(),
        "MuseAI ready"
    );

    if args.once {
        let mut session = session;
        headless::generate_and_print(&mut session).await;
        if session.story().is_none() {
            warn!(phase = %session.phase(), "one-shot generation produced no story");
            bail!("no story was generated");
        }
        return Ok(());
    }

    headless::run_headless(session).await
}
