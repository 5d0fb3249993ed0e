//! Converts a YouTube link or song name into a chord-annotated ChordPro
//! transcription, caching results so repeated requests skip the AI call.

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod models;
pub mod services;

pub use error::{AppError, ConvertError, GenerationError, Result};
pub use models::SongResult;
pub use services::Converter;
