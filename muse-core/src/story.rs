//! The story returned by a successful generation.

use serde::de::Unexpected;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Byline printed under every story title.
pub const BYLINE: &str = "A MuseAI Original";

/// A generated story, exactly as the model returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_note: Option<String>,
}

impl GeneratedStory {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author_note: None,
        }
    }

    pub fn with_author_note(mut self, note: impl Into<String>) -> Self {
        self.author_note = Some(note.into());
        self
    }

    /// Parse the model's JSON output.
    ///
    /// The payload must be a JSON object: `title` and `content` must be
    /// strings; `authorNote` may be absent or null. Nothing is trimmed or
    /// rewritten.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(text)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            other => Err(serde::de::Error::invalid_type(
                unexpected(&other),
                &"a story object",
            )),
        }
    }

    /// Rough word count of the body.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Render as a Markdown document for saving or printing.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n*{BYLINE}*\n\n{}\n", self.title, self.content);
        if let Some(note) = &self.author_note {
            out.push_str("\n---\n\n**Author's note:** ");
            out.push_str(note);
            out.push('\n');
        }
        out
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}
