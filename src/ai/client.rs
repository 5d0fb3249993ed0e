use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Generation mode chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Search grounded, with a reasoning budget. Slower, more accurate.
    Deep,
    /// Latent knowledge only, no grounding, no reasoning budget.
    Express,
}

impl Mode {
    pub fn from_deep_flag(deep: bool) -> Self {
        if deep {
            Mode::Deep
        } else {
            Mode::Express
        }
    }

    pub fn is_deep(self) -> bool {
        self == Mode::Deep
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    /// Enables external search grounding.
    pub grounding: bool,
    pub thinking_budget: u32,
    /// JSON schema the answer must conform to.
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    /// Citation URLs surfaced by search grounding, possibly with duplicates.
    pub source_urls: Vec<String>,
}

/// A hosted text completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}
