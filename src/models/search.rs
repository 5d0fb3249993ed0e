use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analytics row written for every conversion request. Never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub query: String,
    pub ip_address: String,
    pub user_agent: String,
    pub is_cached: bool,
    pub created_at: DateTime<Utc>,
}

/// A candidate video found by the exploratory AI search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSearchHit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub duration: Option<String>,
    pub url: String,
}
