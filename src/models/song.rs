use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::input::derive_dedup_key;

pub const UNKNOWN_SONG: &str = "Unknown Song";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A chord-annotated transcription, either generated or served from cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongResult {
    pub title: String,
    pub artist: String,
    pub release_date: Option<String>,
    pub musical_key: Option<String>,
    pub annotated_content: String,
    pub source_urls: BTreeSet<String>,
    pub is_from_cache: bool,
}

impl SongResult {
    /// Download name for the ChordPro file, e.g. `Let_It_Be.cho`.
    ///
    /// Always a single path component: separators, reserved characters and
    /// control characters become `_`, and leading dots are stripped.
    pub fn file_name(&self) -> String {
        let cleaned: String = self
            .title
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();
        let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
        let stem = joined.trim_start_matches(['.', '_']).trim_end_matches('.');
        if stem.is_empty() {
            "song.cho".to_string()
        } else {
            format!("{}.cho", stem)
        }
    }

    pub fn is_identified(&self) -> bool {
        self.title != UNKNOWN_SONG
    }
}

/// Persisted form of a [`SongResult`] plus its two cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub lookup_key: String,
    pub dedup_key: String,
    pub title: String,
    pub artist: String,
    pub release_date: Option<String>,
    pub musical_key: Option<String>,
    pub annotated_content: String,
    pub source_urls: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn from_song(lookup_key: impl Into<String>, song: &SongResult, updated_at: DateTime<Utc>) -> Self {
        Self {
            lookup_key: lookup_key.into(),
            dedup_key: derive_dedup_key(&song.title, &song.artist, song.release_date.as_deref()),
            title: song.title.clone(),
            artist: song.artist.clone(),
            release_date: song.release_date.clone(),
            musical_key: song.musical_key.clone(),
            annotated_content: song.annotated_content.clone(),
            source_urls: song.source_urls.iter().cloned().collect(),
            updated_at,
        }
    }

    pub fn into_song(self) -> SongResult {
        SongResult {
            title: self.title,
            artist: self.artist,
            release_date: self.release_date,
            musical_key: self.musical_key,
            annotated_content: self.annotated_content,
            source_urls: self.source_urls.into_iter().collect(),
            is_from_cache: true,
        }
    }
}
