use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::db::SongStore;
use crate::error::{AppError, Result};
use crate::models::{CacheRecord, FeedbackEntry, SearchLogEntry};

const SONG_TABLE: &str = "song_cache";
const SEARCH_LOG_TABLE: &str = "search_logs";
const FEEDBACK_TABLE: &str = "feedbacks";

#[derive(Debug, Serialize, Deserialize)]
struct SongRow {
    input_key: String,
    meta_key: String,
    title: String,
    artist: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    musical_key: Option<String>,
    chord_pro_content: String,
    #[serde(default)]
    source_urls: Option<Vec<String>>,
    updated_at: DateTime<Utc>,
}

impl From<CacheRecord> for SongRow {
    fn from(record: CacheRecord) -> Self {
        Self {
            input_key: record.lookup_key,
            meta_key: record.dedup_key,
            title: record.title,
            artist: record.artist,
            release_date: record.release_date,
            musical_key: record.musical_key,
            chord_pro_content: record.annotated_content,
            source_urls: Some(record.source_urls),
            updated_at: record.updated_at,
        }
    }
}

impl From<SongRow> for CacheRecord {
    fn from(row: SongRow) -> Self {
        Self {
            lookup_key: row.input_key,
            dedup_key: row.meta_key,
            title: row.title,
            artist: row.artist,
            release_date: row.release_date,
            musical_key: row.musical_key,
            annotated_content: row.chord_pro_content,
            source_urls: row.source_urls.unwrap_or_default(),
            updated_at: row.updated_at,
        }
    }
}

/// [`SongStore`] backed by a hosted PostgREST API (Supabase and friends).
///
/// The hosted upsert has no recency guard; readers rely on `updated_at`
/// ordering instead.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(query)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, rows: &T, on_conflict: Option<&str>) -> Result<()> {
        let mut request = self
            .authorized(self.client.post(self.table_url(table)))
            .json(rows);
        request = match on_conflict {
            Some(column) => request
                .query(&[("on_conflict", column)])
                .header("Prefer", "resolution=merge-duplicates,return=minimal"),
            None => request.header("Prefer", "return=minimal"),
        };

        let response = request.send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(AppError::StoreApi(format!("HTTP {}: {}", status, error_text)))
}

/// Quotes a value for use inside a PostgREST `or=(...)` filter as an
/// `ilike` substring pattern. `%` and `_` match literally.
fn quote_filter_value(value: &str) -> String {
    let mut like = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            like.push('\\');
        }
        like.push(c);
    }
    let escaped = like.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"*{}*\"", escaped)
}

#[async_trait]
impl SongStore for RestStore {
    async fn find_by_lookup_key(&self, lookup_key: &str) -> Result<Option<CacheRecord>> {
        let rows: Vec<SongRow> = self
            .select(
                SONG_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("input_key", format!("eq.{}", lookup_key)),
                    ("order", "updated_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(CacheRecord::from))
    }

    async fn upsert_song(&self, record: CacheRecord) -> Result<()> {
        let row = SongRow::from(record);
        self.insert(SONG_TABLE, &[row], Some("meta_key")).await
    }

    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<CacheRecord>> {
        let pattern = quote_filter_value(query);
        let rows: Vec<SongRow> = self
            .select(
                SONG_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("or", format!("(title.ilike.{0},artist.ilike.{0})", pattern)),
                    ("order", "updated_at.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(CacheRecord::from).collect())
    }

    async fn recent_songs(&self, limit: usize) -> Result<Vec<CacheRecord>> {
        let rows: Vec<SongRow> = self
            .select(
                SONG_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("order", "updated_at.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(CacheRecord::from).collect())
    }

    async fn insert_search_log(&self, entry: SearchLogEntry) -> Result<()> {
        self.insert(SEARCH_LOG_TABLE, &[entry], None).await
    }

    async fn insert_feedback(&self, entry: FeedbackEntry) -> Result<()> {
        self.insert(FEEDBACK_TABLE, &[entry], None).await
    }

    async fn list_feedbacks(&self) -> Result<Vec<FeedbackEntry>> {
        self.select(
            FEEDBACK_TABLE,
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}
