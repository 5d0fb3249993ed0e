use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_query: Option<String>,
    /// 1 to 5 stars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn new(email: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            song_title: None,
            song_artist: None,
            input_query: None,
            rating: None,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.input_query = Some(query.into());
        self
    }

    pub fn with_song(mut self, title: impl Into<String>, artist: impl Into<String>) -> Self {
        self.song_title = Some(title.into());
        self.song_artist = Some(artist.into());
        self
    }
}
