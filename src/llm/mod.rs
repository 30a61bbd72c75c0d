pub mod error;
pub mod extract;
pub mod gemini;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod types;

use error::ProviderError;
use gemini::GeminiAdapter;
use openai::OpenAiAdapter;
use provider::{Provider, ProviderAdapter};
use types::{GemReport, TrendResponse};

use crate::config::AppConfig;
use crate::media::Creative;

/// Build a fresh adapter for `provider`.
///
/// The API key is read here, at call time, so a missing key only matters for
/// the provider actually in use.
pub fn adapter_for(
    provider: Provider,
    config: &AppConfig,
) -> Result<Box<dyn ProviderAdapter>, ProviderError> {
    Ok(match provider {
        Provider::Gemini => Box::new(GeminiAdapter::from_env(config.gemini.clone())?),
        Provider::OpenAI => Box::new(OpenAiAdapter::from_env(config.openai.clone())?),
    })
}

/// Fetch a trend report from exactly one provider.
pub async fn fetch_trends(
    provider: Provider,
    config: &AppConfig,
) -> Result<TrendResponse, ProviderError> {
    let adapter = adapter_for(provider, config)?;
    fetch_trends_with(adapter.as_ref()).await
}

/// Rate a creative with exactly one provider.
///
/// Size limits are the caller's job; see [`crate::media::Creative::from_file`].
pub async fn rate_creative(
    provider: Provider,
    config: &AppConfig,
    creative: &Creative,
) -> Result<GemReport, ProviderError> {
    let adapter = adapter_for(provider, config)?;
    rate_creative_with(adapter.as_ref(), creative).await
}

/// Run a trend fetch through an already-built adapter.
pub async fn fetch_trends_with(
    adapter: &dyn ProviderAdapter,
) -> Result<TrendResponse, ProviderError> {
    let provider = adapter.provider();
    tracing::debug!(%provider, mode = ?adapter.output_mode(), "fetching trends");
    adapter
        .fetch_trends()
        .await
        .inspect_err(|e| tracing::warn!(%provider, error = %e, "trend fetch failed"))
}

/// Run a rating through an already-built adapter.
pub async fn rate_creative_with(
    adapter: &dyn ProviderAdapter,
    creative: &Creative,
) -> Result<GemReport, ProviderError> {
    let provider = adapter.provider();
    tracing::debug!(
        %provider,
        mode = ?adapter.output_mode(),
        mime = %creative.mime_type,
        bytes = creative.byte_len,
        "rating creative"
    );
    adapter
        .rate_creative(creative)
        .await
        .inspect_err(|e| tracing::warn!(%provider, error = %e, "rating failed"))
}
