//! AI completion collaborator: request/response types, the Gemini client,
//! prompt construction and parsing of the model's JSON answer.

mod client;
mod gemini;
mod parser;
mod prompts;

pub use client::{Completion, CompletionClient, CompletionRequest, Mode};
pub use gemini::{GeminiClient, GEMINI_API_URL, GEMINI_MODEL};
pub use parser::{extract_json, GeneratedSong, ParseError};
pub use prompts::{external_search_request, song_request, song_response_schema};
