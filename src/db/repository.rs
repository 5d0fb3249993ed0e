use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{CacheRecord, FeedbackEntry, SearchLogEntry};

use super::schema::SCHEMA;
use super::store::SongStore;

const SONG_COLUMNS: &str = "input_key, meta_key, title, artist, release_date, musical_key, chord_pro_content, source_urls, updated_at";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            // SQLite's built-in lower() only folds ASCII.
            conn.create_scalar_function(
                "fold_case",
                1,
                FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|v| v.to_lowercase())),
            )?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn count_songs(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM song_cache", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count as usize)
    }

    pub async fn count_search_logs(&self, is_cached: bool) -> Result<usize> {
        let count = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM search_logs WHERE is_cached = ?1",
                    params![is_cached],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl SongStore for SqliteStore {
    async fn find_by_lookup_key(&self, lookup_key: &str) -> Result<Option<CacheRecord>> {
        let lookup_key = lookup_key.to_string();
        let record = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM song_cache WHERE input_key = ?1 ORDER BY updated_at DESC LIMIT 1",
                    SONG_COLUMNS
                ))?;
                let record = stmt
                    .query_row(params![lookup_key], record_from_row)
                    .optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    async fn upsert_song(&self, record: CacheRecord) -> Result<()> {
        let source_urls = serde_json::to_string(&record.source_urls)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO song_cache (input_key, meta_key, title, artist, release_date, musical_key,
                                               chord_pro_content, source_urls, updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                       ON CONFLICT(meta_key) DO UPDATE SET
                           input_key = excluded.input_key,
                           title = excluded.title,
                           artist = excluded.artist,
                           release_date = excluded.release_date,
                           musical_key = excluded.musical_key,
                           chord_pro_content = excluded.chord_pro_content,
                           source_urls = excluded.source_urls,
                           updated_at = excluded.updated_at
                       WHERE excluded.updated_at >= song_cache.updated_at"#,
                    params![
                        record.lookup_key,
                        record.dedup_key,
                        record.title,
                        record.artist,
                        record.release_date,
                        record.musical_key,
                        record.annotated_content,
                        source_urls,
                        format_datetime(&record.updated_at),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<CacheRecord>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let limit = limit as i64;
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {} FROM song_cache
                       WHERE fold_case(title) LIKE ?1 ESCAPE '\' OR fold_case(artist) LIKE ?1 ESCAPE '\'
                       ORDER BY updated_at DESC
                       LIMIT ?2"#,
                    SONG_COLUMNS
                ))?;
                let records = stmt
                    .query_map(params![pattern, limit], record_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    async fn recent_songs(&self, limit: usize) -> Result<Vec<CacheRecord>> {
        let limit = limit as i64;
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM song_cache ORDER BY updated_at DESC LIMIT ?1",
                    SONG_COLUMNS
                ))?;
                let records = stmt
                    .query_map(params![limit], record_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    async fn insert_search_log(&self, entry: SearchLogEntry) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO search_logs (query, ip_address, user_agent, is_cached, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        entry.query,
                        entry.ip_address,
                        entry.user_agent,
                        entry.is_cached,
                        format_datetime(&entry.created_at),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn insert_feedback(&self, entry: FeedbackEntry) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO feedbacks (email, song_title, song_artist, input_query, rating, comment, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                    params![
                        entry.email,
                        entry.song_title,
                        entry.song_artist,
                        entry.input_query,
                        entry.rating,
                        entry.comment,
                        format_datetime(&entry.created_at),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn list_feedbacks(&self) -> Result<Vec<FeedbackEntry>> {
        let feedbacks = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT email, song_title, song_artist, input_query, rating, comment, created_at
                       FROM feedbacks ORDER BY created_at DESC, id DESC"#,
                )?;
                let feedbacks = stmt
                    .query_map([], feedback_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feedbacks)
            })
            .await?;
        Ok(feedbacks)
    }
}

// Fixed width UTC so that text ordering in SQLite matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn record_from_row(row: &Row) -> rusqlite::Result<CacheRecord> {
    let source_urls: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(CacheRecord {
        lookup_key: row.get(0)?,
        dedup_key: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        release_date: row.get(4)?,
        musical_key: row.get(5)?,
        annotated_content: row.get(6)?,
        source_urls: serde_json::from_str(&source_urls).unwrap_or_default(),
        updated_at: parse_datetime(&updated_at).unwrap_or_else(Utc::now),
    })
}

fn feedback_from_row(row: &Row) -> rusqlite::Result<FeedbackEntry> {
    let created_at: String = row.get(6)?;
    Ok(FeedbackEntry {
        email: row.get(0)?,
        song_title: row.get(1)?,
        song_artist: row.get(2)?,
        input_query: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: parse_datetime(&created_at).unwrap_or_else(Utc::now),
    })
}
