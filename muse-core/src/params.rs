//! Story parameters: the draft the user edits before generating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Genres offered as suggestions. Any text is accepted.
pub const GENRES: [&str; 8] = [
    "Fantasy",
    "Horror",
    "Romance",
    "Sci-Fi",
    "Mystery",
    "Adventure",
    "Comedy",
    "Inspirational",
];

/// Tones offered as suggestions. Any text is accepted.
pub const TONES: [&str; 7] = [
    "Dark",
    "Funny",
    "Emotional",
    "Scary",
    "Hopeful",
    "Mysterious",
    "Inspirational",
];

/// Errors from editing story parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Unknown field '{0}' (expected genre, characterName, setting, tone or length)")]
    UnknownField(String),

    #[error("Invalid length '{0}' (expected Short, Medium or Long)")]
    InvalidLength(String),
}

/// Target length of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl StoryLength {
    pub const ALL: [StoryLength; 3] = [StoryLength::Short, StoryLength::Medium, StoryLength::Long];

    pub fn name(self) -> &'static str {
        match self {
            StoryLength::Short => "Short",
            StoryLength::Medium => "Medium",
            StoryLength::Long => "Long",
        }
    }

    /// Approximate word count the model is asked to aim for.
    pub fn target_words(self) -> usize {
        match self {
            StoryLength::Short => 300,
            StoryLength::Medium => 700,
            StoryLength::Long => 1200,
        }
    }
}

impl fmt::Display for StoryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoryLength {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoryLength::ALL
            .into_iter()
            .find(|length| length.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParamError::InvalidLength(s.to_string()))
    }
}

/// One editable field of [`StoryParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    Genre,
    CharacterName,
    Setting,
    Tone,
    Length,
}

impl ParamField {
    pub const ALL: [ParamField; 5] = [
        ParamField::Genre,
        ParamField::CharacterName,
        ParamField::Setting,
        ParamField::Tone,
        ParamField::Length,
    ];

    /// The field's wire name.
    pub fn name(self) -> &'static str {
        match self {
            ParamField::Genre => "genre",
            ParamField::CharacterName => "characterName",
            ParamField::Setting => "setting",
            ParamField::Tone => "tone",
            ParamField::Length => "length",
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamField {
    type Err = ParamError;

    /// Accepts the wire name as well as snake_case, kebab-case and the short
    /// alias `character`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "genre" => Ok(ParamField::Genre),
            "charactername" | "character" => Ok(ParamField::CharacterName),
            "setting" => Ok(ParamField::Setting),
            "tone" => Ok(ParamField::Tone),
            "length" => Ok(ParamField::Length),
            _ => Err(ParamError::UnknownField(s.to_string())),
        }
    }
}

/// Parameters for one story.
///
/// Genre and tone are free text; [`GENRES`] and [`TONES`] are only the
/// suggested values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryParams {
    pub genre: String,
    pub character_name: String,
    pub setting: String,
    pub tone: String,
    pub length: StoryLength,
}

impl Default for StoryParams {
    fn default() -> Self {
        Self {
            genre: "Fantasy".to_string(),
            character_name: String::new(),
            setting: String::new(),
            tone: "Hopeful".to_string(),
            length: StoryLength::Medium,
        }
    }
}

impl StoryParams {
    /// Replace a single field, leaving the others untouched.
    ///
    /// Text fields are stored verbatim. Only `length` is checked, because it
    /// has a closed set of values; on error the field keeps its old value.
    pub fn set_field(&mut self, field: ParamField, value: impl Into<String>) -> Result<(), ParamError> {
        let value = value.into();
        match field {
            ParamField::Genre => self.genre = value,
            ParamField::CharacterName => self.character_name = value,
            ParamField::Setting => self.setting = value,
            ParamField::Tone => self.tone = value,
            ParamField::Length => self.length = value.parse()?,
        }
        Ok(())
    }

    /// Current value of a field as text.
    pub fn get(&self, field: ParamField) -> String {
        match field {
            ParamField::Genre => self.genre.clone(),
            ParamField::CharacterName => self.character_name.clone(),
            ParamField::Setting => self.setting.clone(),
            ParamField::Tone => self.tone.clone(),
            ParamField::Length => self.length.to_string(),
        }
    }

    /// Required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<ParamField> {
        let mut missing = Vec::new();
        if self.character_name.is_empty() {
            missing.push(ParamField::CharacterName);
        }
        if self.setting.is_empty() {
            missing.push(ParamField::Setting);
        }
        missing
    }

    /// Whether a generation request may be made with these parameters.
    pub fn is_ready(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Whether the genre is one of the suggested [`GENRES`].
    pub fn has_catalog_genre(&self) -> bool {
        GENRES.contains(&self.genre.as_str())
    }

    /// Whether the tone is one of the suggested [`TONES`].
    pub fn has_catalog_tone(&self) -> bool {
        TONES.contains(&self.tone.as_str())
    }
}
