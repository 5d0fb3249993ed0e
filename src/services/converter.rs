use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::ai::{extract_json, song_request, Completion, CompletionClient, GeminiClient, GeneratedSong, Mode};
use crate::config::{Config, StoreConfig};
use crate::db::{SongStore, SqliteStore};
use crate::error::{ConvertError, GenerationError, Result};
use crate::input::{derive_lookup_key, is_youtube_url, mentions_youtube};
use crate::models::{CacheRecord, SearchLogEntry, SongResult, UNKNOWN_ARTIST, UNKNOWN_SONG};

use super::RestStore;

/// Tunables for the converter that do not depend on the collaborators.
#[derive(Debug, Clone)]
pub struct ConverterSettings {
    pub deep_timeout: Duration,
    pub express_timeout: Duration,
    pub deep_thinking_budget: u32,
    /// Recorded on search logs as the request origin.
    pub client_label: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            deep_timeout: Duration::from_secs(180),
            express_timeout: Duration::from_secs(60),
            deep_thinking_budget: 20_000,
            client_label: "cli".to_string(),
        }
    }
}

impl ConverterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            deep_timeout: Duration::from_secs(config.deep_timeout_secs),
            express_timeout: Duration::from_secs(config.express_timeout_secs),
            deep_thinking_budget: config.deep_thinking_budget,
            client_label: config.client_label.clone(),
        }
    }

    pub fn timeout_for(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Deep => self.deep_timeout,
            Mode::Express => self.express_timeout,
        }
    }
}

/// Turns raw user input into a [`SongResult`], serving from the cache when
/// possible and falling back to the AI collaborator.
///
/// Both collaborators are optional. Without a store every read is a miss and
/// every write is dropped; without an AI client only cache hits succeed.
/// Search logs and cache writes run in the background; call
/// [`Converter::flush`] to wait for them. Dropping the converter detaches
/// unfinished writes, which keep running on the runtime.
pub struct Converter {
    pub(super) store: Option<Arc<dyn SongStore>>,
    pub(super) ai: Option<Arc<dyn CompletionClient>>,
    pub(super) settings: ConverterSettings,
    pending: Mutex<JoinSet<()>>,
}

impl Converter {
    pub fn new(
        store: Option<Arc<dyn SongStore>>,
        ai: Option<Arc<dyn CompletionClient>>,
        settings: ConverterSettings,
    ) -> Self {
        Self {
            store,
            ai,
            settings,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let settings = ConverterSettings::from_config(config);

        let store: Option<Arc<dyn SongStore>> = match &config.store {
            StoreConfig::Sqlite { db_path } => match SqliteStore::new(db_path).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!(db_path = %db_path, error = %e, "Could not open song cache, running uncached");
                    None
                }
            },
            StoreConfig::Rest { url, api_key } => Some(Arc::new(RestStore::new(url, api_key.clone())?)),
            StoreConfig::Disabled => None,
        };

        if store.is_none() {
            tracing::warn!("No song store configured, conversions will not be cached");
        }

        let ai: Option<Arc<dyn CompletionClient>> = match &config.gemini_api_key {
            Some(key) => {
                let ceiling = settings.deep_timeout.max(settings.express_timeout) + Duration::from_secs(5);
                Some(Arc::new(GeminiClient::with_endpoint(
                    key.clone(),
                    &config.api_base_url,
                    &config.model,
                    ceiling,
                )?))
            }
            None => None,
        };

        Ok(Self::new(store, ai, settings))
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub async fn convert(&self, raw_input: &str, deep_mode: bool) -> std::result::Result<SongResult, ConvertError> {
        let input = raw_input.trim();
        if input.is_empty() {
            return Err(ConvertError::Validation(
                "Please enter a YouTube URL or song name.".to_string(),
            ));
        }

        let is_video = is_youtube_url(input);
        if mentions_youtube(input) && !is_video {
            return Err(ConvertError::Validation(
                "Invalid YouTube URL. Please provide a valid YouTube link (youtube.com or youtu.be).".to_string(),
            ));
        }

        let lookup_key = derive_lookup_key(input);

        if let Some(song) = self.cached(&lookup_key).await {
            tracing::debug!(lookup_key = %lookup_key, "Cache hit");
            self.log_search(input, true).await;
            return Ok(song);
        }
        tracing::debug!(lookup_key = %lookup_key, "Cache miss");

        let ai = self.ai.as_ref().ok_or(GenerationError::Unavailable)?;
        let mode = Mode::from_deep_flag(deep_mode);
        let request = song_request(input, is_video, mode, self.settings.deep_thinking_budget);

        let completion = match tokio::time::timeout(self.settings.timeout_for(mode), ai.complete(&request)).await {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                tracing::warn!(model = ai.model(), error = %e, "Completion request failed");
                return Err(GenerationError::from(e).into());
            }
            Err(_) => {
                tracing::warn!(model = ai.model(), ?mode, "Completion request timed out");
                return Err(GenerationError::Timeout.into());
            }
        };

        self.log_search(input, false).await;

        let song = song_from_completion(&completion, is_video)?;
        self.persist(lookup_key, &song).await;

        Ok(song)
    }

    /// Waits for every background search log and cache write started so far.
    pub async fn flush(&self) {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Background write task failed");
            }
        }
    }

    async fn cached(&self, lookup_key: &str) -> Option<SongResult> {
        let store = self.store.as_ref()?;
        match store.find_by_lookup_key(lookup_key).await {
            Ok(record) => record.map(CacheRecord::into_song),
            Err(e) => {
                tracing::warn!(lookup_key = %lookup_key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn log_search(&self, query: &str, is_cached: bool) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let entry = SearchLogEntry {
            query: query.to_string(),
            ip_address: self.settings.client_label.clone(),
            user_agent: concat!("chordpro-scribe/", env!("CARGO_PKG_VERSION")).to_string(),
            is_cached,
            created_at: Utc::now(),
        };
        self.spawn_background(async move {
            if let Err(e) = store.insert_search_log(entry).await {
                tracing::debug!(error = %e, "Search log write failed");
            }
        })
        .await;
    }

    async fn persist(&self, lookup_key: String, song: &SongResult) {
        let Some(store) = self.store.clone() else {
            return;
        };
        if !song.is_identified() || song.annotated_content.trim().is_empty() {
            return;
        }

        // Stamped now so a slower earlier write cannot win over this one.
        let record = CacheRecord::from_song(lookup_key, song, Utc::now());
        self.spawn_background(async move {
            let dedup_key = record.dedup_key.clone();
            match store.upsert_song(record).await {
                Ok(()) => tracing::debug!(dedup_key = %dedup_key, "Cached conversion"),
                Err(e) => tracing::error!(dedup_key = %dedup_key, error = %e, "Cache persistence failed"),
            }
        })
        .await;
    }

    pub(super) async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(task);
    }
}

impl Drop for Converter {
    fn drop(&mut self) {
        self.pending.get_mut().detach_all();
    }
}

fn song_from_completion(completion: &Completion, is_video: bool) -> std::result::Result<SongResult, GenerationError> {
    let object = extract_json(&completion.text)?;
    let generated = GeneratedSong::from_object(&object);

    if let Some(reason) = generated.error {
        let reason = reason.trim();
        return Err(GenerationError::Declined(if reason.is_empty() {
            "no reason given".to_string()
        } else {
            reason.to_string()
        }));
    }

    let content = generated.chord_pro_content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(GenerationError::EmptyContent);
    }

    let title = generated.title.unwrap_or_else(|| UNKNOWN_SONG.to_string());
    if is_video && title == UNKNOWN_SONG {
        return Err(GenerationError::Unidentified);
    }

    let source_urls: BTreeSet<String> = completion
        .source_urls
        .iter()
        .filter(|url| !url.trim().is_empty())
        .cloned()
        .collect();

    Ok(SongResult {
        title,
        artist: generated.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        release_date: generated.release_date,
        musical_key: generated.key,
        annotated_content: content,
        source_urls,
        is_from_cache: false,
    })
}
