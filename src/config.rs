use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::llm::provider::{Provider, Task};
use crate::media::DEFAULT_MAX_UPLOAD_BYTES;
use crate::paths;

/// Settings from `config.toml`. Every section and key is optional; anything
/// left out keeps its built-in value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub trend_model: String,
    pub rating_model: String,
    /// Ground trend reports in live Google Search results. The API refuses a
    /// response schema alongside search, so this trades the schema for
    /// citations.
    pub search_grounding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub trend_model: String,
    pub rating_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest creative sent inline, in bytes.
    pub max_bytes: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            trend_model: Provider::Gemini.default_model(Task::Trends).into(),
            rating_model: Provider::Gemini.default_model(Task::Rating).into(),
            search_grounding: true,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            trend_model: Provider::OpenAI.default_model(Task::Trends).into(),
            rating_model: Provider::OpenAI.default_model(Task::Rating).into(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Point both of a provider's tasks at one model, e.g. from `--model`.
    pub fn override_model(&mut self, provider: Provider, model: &str) {
        match provider {
            Provider::Gemini => {
                self.gemini.trend_model = model.to_string();
                self.gemini.rating_model = model.to_string();
            }
            Provider::OpenAI => {
                self.openai.trend_model = model.to_string();
                self.openai.rating_model = model.to_string();
            }
        }
    }
}

/// Read `$XDG_CONFIG_HOME/trendlag/config.toml`, or the built-in settings
/// when there is no such file.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&paths::config_file())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
