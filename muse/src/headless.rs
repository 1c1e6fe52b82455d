//! Line-oriented interface for the story session.
//!
//! Lines starting with `#` are commands; anything else gets a hint. All
//! output goes to stdout, logs go to stderr.

use muse_core::{
    ParamField, Phase, StoryGenerator, StoryParams, StorySession, GENRES, TONES,
};
use std::io::{self, BufRead, Write};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Set { field: String, value: String },
    Generate,
    Reset,
    Status,
    Options,
    Save(Option<String>),
    Help,
    Quit,
    Unknown(String),
    Text,
}

fn parse_command(line: &str) -> Command {
    let Some(rest) = line.strip_prefix('#') else {
        return Command::Text;
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "set" => {
            let (field, value) = match args.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None => (args, ""),
            };
            Command::Set {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "generate" | "go" => Command::Generate,
        "reset" | "new" => Command::Reset,
        "status" => Command::Status,
        "options" => Command::Options,
        "save" => Command::Save((!args.is_empty()).then(|| args.to_string())),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

/// Run the session in interactive mode until `#quit` or end of input.
pub async fn run_headless<G: StoryGenerator + 'static>(mut session: StorySession<G>) -> anyhow::Result<()> {
    println!("=== MuseAI ===");
    println!("Tell us a character, a setting, and a mood.");
    println!();
    print_help();
    println!();
    print_params(session.params());
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Command::Set { field, value } => match field.parse::<ParamField>() {
                Ok(field) => match session.set_field(field, value.as_str()) {
                    Ok(()) => println!("[SET] {field} = {}", session.params().get(field)),
                    Err(e) => println!("[ERROR] {e}"),
                },
                Err(e) => println!("[ERROR] {e}"),
            },
            Command::Generate => generate_and_print(&mut session).await,
            Command::Reset => match session.reset() {
                Ok(()) => {
                    println!("[RESET] Ready for a new story.");
                    print_params(session.params());
                }
                Err(e) => println!("[ERROR] {e}"),
            },
            Command::Status => {
                println!("[STATUS] {}", session.phase());
                print_params(session.params());
                if let Some(story) = session.story() {
                    println!("  Story: {} ({} words)", story.title, story.word_count());
                }
                if let Some(error) = session.error() {
                    println!("  Error: {error}");
                }
            }
            Command::Options => print_options(),
            Command::Save(Some(path)) => match session.save_story(&path).await {
                Ok(()) => println!("[SAVED] Story saved to {path}"),
                Err(e) => println!("[ERROR] Save failed: {e}"),
            },
            Command::Save(None) => println!("[ERROR] Usage: #save <path>"),
            Command::Help => print_help(),
            Command::Quit => {
                println!("Goodbye!");
                break;
            }
            Command::Unknown(name) => {
                println!("[ERROR] Unknown command: #{name}. Type #help for commands.");
            }
            Command::Text => {
                println!("[HINT] Use #set <field> <value>, then #generate. Type #help for commands.");
            }
        }

        stdout.flush().ok();
    }

    Ok(())
}

/// Submit, wait for the outcome and print it.
pub async fn generate_and_print<G: StoryGenerator + 'static>(session: &mut StorySession<G>) {
    if let Err(e) = session.submit() {
        println!("[ERROR] {e}");
        return;
    }

    println!("[GENERATING] Consulting the Muses... this takes about 20-30 seconds.");
    io::stdout().flush().ok();

    session.finish().await;

    match session.phase() {
        Phase::Success => {
            if let Some(story) = session.story() {
                println!();
                println!("{}", "=".repeat(60));
                println!("{}", story.title);
                println!("{}", muse_core::story::BYLINE);
                println!("{}", "=".repeat(60));
                println!();
                println!("{}", story.content);
                if let Some(note) = &story.author_note {
                    println!();
                    println!("--- Author's note ---");
                    println!("{note}");
                }
                println!();
                println!("Type #new for another story or #save <path> to keep this one.");
            }
        }
        Phase::Error => {
            println!("[ERROR] {}", session.error().unwrap_or_default());
        }
        Phase::Idle | Phase::Generating => {}
    }
}

fn print_params(params: &StoryParams) {
    println!("[PARAMS]");
    for field in ParamField::ALL {
        let value = params.get(field);
        let shown = if value.is_empty() { "(empty)".to_string() } else { value };
        println!("  {field}: {shown}");
    }
    if !params.is_ready() {
        let missing: Vec<_> = params.missing_fields().iter().map(|f| f.name()).collect();
        println!("  Required before generating: {}", missing.join(", "));
    }
}

fn print_options() {
    println!("[OPTIONS]");
    println!("  Genres: {}", GENRES.join(", "));
    println!("  Tones: {}", TONES.join(", "));
    println!("  Lengths: Short (~300 words), Medium (~700 words), Long (~1200 words)");
    println!("  Genre and tone also accept any custom text.");
}

fn print_help() {
    println!("Commands:");
    println!("  #set <field> <value> - Set genre, character, setting, tone or length");
    println!("  #generate            - Generate a story (alias: #go)");
    println!("  #new                 - Start over, keeping your parameters (alias: #reset)");
    println!("  #status              - Show the current state and parameters");
    println!("  #options             - List suggested genres, tones and lengths");
    println!("  #save <path>         - Save the story as Markdown");
    println!("  #help                - Show this help");
    println!("  #quit                - Exit");
}
