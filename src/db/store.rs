use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CacheRecord, FeedbackEntry, SearchLogEntry};

/// Persistence for cached songs, search analytics and feedback.
///
/// Callers treat every error as non-fatal; implementations only need to
/// report them.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Most recently updated record stored under `lookup_key`.
    async fn find_by_lookup_key(&self, lookup_key: &str) -> Result<Option<CacheRecord>>;

    /// Inserts or replaces the row sharing `record.dedup_key`. A row that is
    /// already newer than `record.updated_at` is left untouched.
    async fn upsert_song(&self, record: CacheRecord) -> Result<()>;

    /// Case-insensitive substring match on title or artist, newest first.
    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<CacheRecord>>;

    async fn recent_songs(&self, limit: usize) -> Result<Vec<CacheRecord>>;

    async fn insert_search_log(&self, entry: SearchLogEntry) -> Result<()>;

    async fn insert_feedback(&self, entry: FeedbackEntry) -> Result<()>;

    /// All feedback, newest first.
    async fn list_feedbacks(&self) -> Result<Vec<FeedbackEntry>>;
}
