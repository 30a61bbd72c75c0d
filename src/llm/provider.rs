use std::fmt;

use async_trait::async_trait;

use super::error::ProviderError;
use super::types::{GemReport, TrendResponse};
use crate::media::Creative;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
}

/// Which of the two operations a model is being picked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Trends,
    Rating,
}

/// How tightly the upstream API can be held to our output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// The request carries a response schema and the API enforces it.
    Structured,
    /// The API only promises "some JSON object".
    Freeform,
}

impl Provider {
    /// Parse from a CLI string like "gemini" or "gpt".
    pub fn from_str_loose(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" | "gpt" | "chatgpt" => Ok(Provider::OpenAI),
            _ => anyhow::bail!("Unknown provider: {s}. Use 'gemini' or 'openai'."),
        }
    }

    /// Environment variables checked for this provider's API key, in order.
    /// `API_KEY` is the older, unprefixed name for the Gemini key.
    pub fn api_key_envs(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => &["GEMINI_API_KEY", "API_KEY"],
            Provider::OpenAI => &["OPENAI_API_KEY"],
        }
    }

    /// The preferred environment variable name, used in error messages.
    pub fn api_key_env(&self) -> &'static str {
        self.api_key_envs()[0]
    }

    /// Read the API key from the environment.
    pub fn api_key(&self) -> Result<String, ProviderError> {
        self.api_key_from(|var| std::env::var(var).ok())
    }

    /// Resolve the API key through `lookup`. Blank values count as missing.
    pub fn api_key_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ProviderError> {
        self.api_key_envs()
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()))
            .map(|v| v.trim().to_string())
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: *self,
                env_var: self.api_key_env(),
            })
    }

    /// Model ID used for a task when the config doesn't override it.
    pub fn default_model(&self, task: Task) -> &'static str {
        match (self, task) {
            (Provider::Gemini, Task::Trends) => "gemini-3-flash-preview",
            (Provider::Gemini, Task::Rating) => "gemini-3-pro-preview",

            (Provider::OpenAI, Task::Trends) => "gpt-4o",
            (Provider::OpenAI, Task::Rating) => "gpt-4o",
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        match self {
            Provider::Gemini => OutputMode::Structured,
            Provider::OpenAI => OutputMode::Freeform,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::OpenAI => write!(f, "OpenAI"),
        }
    }
}

/// The two operations every provider adapter offers.
///
/// Implementations turn one upstream response into a fully validated value or
/// exactly one classified [`ProviderError`]. They never retry and keep no
/// state between calls.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    fn output_mode(&self) -> OutputMode {
        self.provider().output_mode()
    }

    /// Ask the model for a cross-region viral trend report.
    async fn fetch_trends(&self) -> Result<TrendResponse, ProviderError>;

    /// Score an uploaded creative against the GEM rubric.
    async fn rate_creative(&self, creative: &Creative) -> Result<GemReport, ProviderError>;
}
