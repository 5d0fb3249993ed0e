#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use chordpro_scribe::ai::{Completion, CompletionClient, CompletionRequest};
use chordpro_scribe::db::{SongStore, SqliteStore};
use chordpro_scribe::error::{AppError, Result};
use chordpro_scribe::models::{CacheRecord, FeedbackEntry, SearchLogEntry};
use chordpro_scribe::services::{Converter, ConverterSettings};

/// Completion client that replays scripted answers and records requests.
pub struct MockAi {
    responses: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockAi {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond_text(self, text: impl Into<String>) -> Self {
        self.respond(Ok(Completion {
            text: text.into(),
            source_urls: Vec::new(),
        }))
    }

    pub fn respond_song(self, title: &str, artist: &str, content: &str, sources: &[&str]) -> Self {
        let text = json!({
            "title": title,
            "artist": artist,
            "key": "C",
            "chordProContent": content,
        })
        .to_string();
        self.respond(Ok(Completion {
            text,
            source_urls: sources.iter().map(|s| s.to_string()).collect(),
        }))
    }

    pub fn respond(self, response: Result<Completion>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for MockAi {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::GeminiApi("no scripted response".to_string())))
    }
}

/// SQLite-backed store that counts every call and can be switched to fail.
pub struct CountingStore {
    pub inner: SqliteStore,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    pub async fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().await.unwrap(),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::StoreApi("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SongStore for CountingStore {
    async fn find_by_lookup_key(&self, lookup_key: &str) -> Result<Option<CacheRecord>> {
        self.enter()?;
        self.inner.find_by_lookup_key(lookup_key).await
    }

    async fn upsert_song(&self, record: CacheRecord) -> Result<()> {
        self.enter()?;
        self.inner.upsert_song(record).await
    }

    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<CacheRecord>> {
        self.enter()?;
        self.inner.search_songs(query, limit).await
    }

    async fn recent_songs(&self, limit: usize) -> Result<Vec<CacheRecord>> {
        self.enter()?;
        self.inner.recent_songs(limit).await
    }

    async fn insert_search_log(&self, entry: SearchLogEntry) -> Result<()> {
        self.enter()?;
        self.inner.insert_search_log(entry).await
    }

    async fn insert_feedback(&self, entry: FeedbackEntry) -> Result<()> {
        self.enter()?;
        self.inner.insert_feedback(entry).await
    }

    async fn list_feedbacks(&self) -> Result<Vec<FeedbackEntry>> {
        self.enter()?;
        self.inner.list_feedbacks().await
    }
}

pub fn converter(store: Option<Arc<CountingStore>>, ai: Option<Arc<MockAi>>) -> Converter {
    converter_with(store, ai, ConverterSettings::default())
}

pub fn converter_with(
    store: Option<Arc<CountingStore>>,
    ai: Option<Arc<MockAi>>,
    settings: ConverterSettings,
) -> Converter {
    Converter::new(
        store.map(|s| s as Arc<dyn SongStore>),
        ai.map(|a| a as Arc<dyn CompletionClient>),
        settings,
    )
}

pub fn cached_record(lookup_key: &str, title: &str, artist: &str, content: &str) -> CacheRecord {
    CacheRecord {
        lookup_key: lookup_key.to_string(),
        dedup_key: chordpro_scribe::input::derive_dedup_key(title, artist, None),
        title: title.to_string(),
        artist: artist.to_string(),
        release_date: None,
        musical_key: Some("G".to_string()),
        annotated_content: content.to_string(),
        source_urls: vec!["https://source.example".to_string()],
        updated_at: Utc::now(),
    }
}
