use thiserror::Error;

use crate::ai::ParseError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store API error: {0}")]
    StoreApi(String),

    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    #[error("Request timed out")]
    Timeout,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures that cross the converter boundary. Store and log failures are
/// absorbed before they get here.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("The AI declined to transcribe this song: {0}")]
    Declined(String),

    #[error("Invalid format returned by AI: {0}")]
    Malformed(#[from] ParseError),

    #[error("This doesn't appear to be a song. Please provide a YouTube video of a song or a song name.")]
    EmptyContent,

    #[error("Could not identify the song from the YouTube URL. Please ensure the video is of a song and try again.")]
    Unidentified,

    #[error("The AI took too long to answer. Try express mode or try again later.")]
    Timeout,

    #[error("No Gemini API key is configured.")]
    Unavailable,

    #[error("AI request failed: {0}")]
    Api(String),
}

impl From<AppError> for GenerationError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Timeout => GenerationError::Timeout,
            other => GenerationError::Api(other.to_string()),
        }
    }
}
