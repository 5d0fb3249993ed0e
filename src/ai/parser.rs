use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced block pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty AI response")]
    Empty,

    #[error("no JSON object found in AI response")]
    NoJsonObject,
}

/// Pulls a JSON object out of a model answer that may be wrapped in prose or
/// markdown fences.
///
/// Tried in order: the whole trimmed text, the inside of the first fenced
/// block, then the span from the first `{` to the last `}`.
pub fn extract_json(raw_text: &str) -> Result<Map<String, Value>, ParseError> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(object) = parse_object(trimmed) {
        return Ok(object);
    }

    if let Some(inner) = FENCED_BLOCK_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|inner| !inner.is_empty())
    {
        if let Some(object) = parse_object(inner) {
            return Ok(object);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(object) = parse_object(&trimmed[start..=end]) {
                return Ok(object);
            }
        }
    }

    Err(ParseError::NoJsonObject)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// The song payload as the model returns it. Every field is optional here;
/// the converter decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedSong {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub release_date: Option<String>,
    pub key: Option<String>,
    pub chord_pro_content: Option<String>,
    /// Set when the model declines instead of guessing.
    pub error: Option<String>,
}

impl GeneratedSong {
    /// Lenient mapping: fields of the wrong type are treated as absent.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            title: text("title"),
            artist: text("artist"),
            release_date: text("releaseDate"),
            key: text("key"),
            chord_pro_content: object
                .get("chordProContent")
                .and_then(Value::as_str)
                .map(str::to_string),
            error: object.get("error").and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
        }
    }
}
