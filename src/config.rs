use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::Mode;
use crate::error::{AppError, Result};

const APP_DIR: &str = "chordpro-scribe";

/// Where cached songs, search logs and feedback live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Sqlite {
        #[serde(default = "default_db_path")]
        db_path: String,
    },
    /// Hosted PostgREST endpoint (e.g. Supabase).
    Rest { url: String, api_key: String },
    /// Uncached, AI-only operation.
    Disabled,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_deep_timeout")]
    pub deep_timeout_secs: u64,

    #[serde(default = "default_express_timeout")]
    pub express_timeout_secs: u64,

    #[serde(default = "default_thinking_budget")]
    pub deep_thinking_budget: u32,

    #[serde(default = "default_mode")]
    pub default_mode: Mode,

    #[serde(default = "default_client_label")]
    pub client_label: String,

    pub share_base_url: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("songs.db").to_string_lossy().to_string()
}

fn default_model() -> String {
    crate::ai::GEMINI_MODEL.to_string()
}

fn default_api_base_url() -> String {
    crate::ai::GEMINI_API_URL.to_string()
}

fn default_deep_timeout() -> u64 {
    180
}

fn default_express_timeout() -> u64 {
    60
}

fn default_thinking_budget() -> u32 {
    20_000
}

fn default_mode() -> Mode {
    Mode::Deep
}

fn default_client_label() -> String {
    "cli".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: default_model(),
            api_base_url: default_api_base_url(),
            deep_timeout_secs: default_deep_timeout(),
            express_timeout_secs: default_express_timeout(),
            deep_thinking_budget: default_thinking_budget(),
            default_mode: default_mode(),
            client_label: default_client_label(),
            share_base_url: None,
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config file (writing defaults on first run), then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// `GEMINI_API_KEY` replaces the configured key; `STORE_URL` together with
    /// `STORE_API_KEY` switches to the hosted store.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }

        match (non_empty("STORE_URL"), non_empty("STORE_API_KEY")) {
            (Some(url), Some(api_key)) => self.store = StoreConfig::Rest { url, api_key },
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("STORE_URL and STORE_API_KEY must both be set, ignoring");
            }
            (None, None) => {}
        }
    }
}
