//! Prompt text and response schema for story generation.

use crate::params::{StoryLength, StoryParams};
use gemini::Schema;

/// Persona and output rules sent as the system instruction.
pub const SYSTEM_INSTRUCTION: &str = r#"You are MuseAI, an expert Story Generator.
Your job is to create original, creative, and engaging stories based on the user's input.

Rules:
1. Write in clear, simple, and interesting language.
2. Match the selected genre, tone, and length perfectly.
3. Use strong character development with clear beginning, middle, and ending arcs.
4. Add vivid dialogue where suitable.
5. Build suspense gradually.
6. End with a memorable twist or emotional conclusion.
7. Avoid copying existing intellectual properties.
8. Output the response in a structured JSON format with "title", "content", and an optional "authorNote".

Length Guidelines:
"#;

/// Full system instruction, including the per-length word targets.
pub fn system_instruction() -> String {
    let mut text = SYSTEM_INSTRUCTION.to_string();
    for length in StoryLength::ALL {
        text.push_str(&format!("- {length}: ~{} words.\n", length.target_words()));
    }
    text
}

/// Build the user prompt for one story.
pub fn story_prompt(params: &StoryParams) -> String {
    format!(
        "Generate a {length} story in the {genre} genre.\n\
         Main Character: {character}\n\
         Setting: {setting}\n\
         Tone: {tone}\n\
         \n\
         Ensure the story feels immersive and professionally written.",
        length = params.length,
        genre = params.genre,
        character = params.character_name,
        setting = params.setting,
        tone = params.tone,
    )
}

/// Schema the model's JSON output must match.
pub fn story_schema() -> Schema {
    Schema::object()
        .required_property("title", Schema::string().with_description("The story's title"))
        .required_property("content", Schema::string().with_description("The full story text"))
        .property(
            "authorNote",
            Schema::string().with_description("A short note from the author about the story"),
        )
}
