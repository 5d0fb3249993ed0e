use serde_json::Value;

use crate::ai::{external_search_request, extract_json, Mode};
use crate::error::ConvertError;
use crate::models::{CacheRecord, ExternalSearchHit, FeedbackEntry, SongResult};

use super::Converter;

/// Entries shown on the home screen.
pub const HOME_RECENT_LIMIT: usize = 6;
/// Entries shown on the library page.
pub const LIBRARY_RECENT_LIMIT: usize = 24;

impl Converter {
    /// Cached songs whose title or artist contains `query`, newest first.
    pub async fn search_cache(&self, query: &str, limit: usize) -> Vec<SongResult> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };

        match store.search_songs(query, limit).await {
            Ok(records) => records.into_iter().map(CacheRecord::into_song).collect(),
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Cache search failed");
                Vec::new()
            }
        }
    }

    pub async fn list_recent(&self, limit: usize) -> Vec<SongResult> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };

        match store.recent_songs(limit).await {
            Ok(records) => records.into_iter().map(CacheRecord::into_song).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Library fetch failed");
                Vec::new()
            }
        }
    }

    pub async fn submit_feedback(&self, entry: FeedbackEntry) -> Result<(), ConvertError> {
        if entry.email.trim().is_empty() {
            return Err(ConvertError::Validation("Please enter your email.".to_string()));
        }
        if let Some(rating) = entry.rating {
            if !(1..=5).contains(&rating) {
                return Err(ConvertError::Validation(
                    "Rating must be between 1 and 5 stars.".to_string(),
                ));
            }
        }

        let Some(store) = self.store.as_ref() else {
            tracing::debug!("No store configured, dropping feedback");
            return Ok(());
        };

        if let Err(e) = store.insert_feedback(entry).await {
            tracing::error!(error = %e, "Feedback submission failed");
        }
        Ok(())
    }

    pub async fn fetch_feedbacks(&self) -> Vec<FeedbackEntry> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };

        store.list_feedbacks().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Feedback fetch failed");
            Vec::new()
        })
    }

    /// Best-effort grounded search for candidate videos. Never fails; any
    /// problem yields an empty list.
    pub async fn search_external(&self, query: &str, limit: usize) -> Vec<ExternalSearchHit> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let Some(ai) = self.ai.as_ref() else {
            return Vec::new();
        };

        let request = external_search_request(query, limit);
        let completion = match tokio::time::timeout(
            self.settings.timeout_for(Mode::Express),
            ai.complete(&request),
        )
        .await
        {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                tracing::debug!(query = %query, error = %e, "External search failed");
                return Vec::new();
            }
            Err(_) => {
                tracing::debug!(query = %query, "External search timed out");
                return Vec::new();
            }
        };

        let object = match extract_json(&completion.text) {
            Ok(object) => object,
            Err(e) => {
                tracing::debug!(query = %query, error = %e, "External search returned no JSON");
                return Vec::new();
            }
        };

        let Some(Value::Array(results)) = object.get("results") else {
            return Vec::new();
        };

        results
            .iter()
            .filter_map(|value| serde_json::from_value::<ExternalSearchHit>(value.clone()).ok())
            .filter(|hit| !hit.id.trim().is_empty() && !hit.url.trim().is_empty())
            .take(limit)
            .collect()
    }
}
