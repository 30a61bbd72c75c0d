use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{classify, Failure, ProviderError};
use super::extract;
use super::prompt;
use super::provider::{Provider, ProviderAdapter};
use super::types::{GemReport, TrendResponse};
use crate::config::OpenAiConfig;
use crate::media::Creative;

const PROVIDER: Provider = Provider::OpenAI;

/// Request body for the Chat Completions API.
#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

/// JSON-object mode: the reply is some JSON object, shape not enforced.
#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self { kind: "json_object" }
    }
}

impl Message {
    fn system(text: String) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text),
        }
    }

    fn user(content: MessageContent) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Response from the Chat Completions API.
#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI error response shape.
#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    /// Usually a string token, occasionally null or numeric.
    code: Option<Value>,
}

/// Freeform JSON adapter for the OpenAI API.
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiAdapter {
    pub fn new(api_key: impl Into<String>, config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Build an adapter with the key from the environment.
    pub fn from_env(config: OpenAiConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(PROVIDER.api_key()?, config))
    }

    /// Send a chat completion and return the message content string.
    async fn complete(&self, request: &Request<'_>) -> Result<String, ProviderError> {
        let model = request.model;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(model, "sending OpenAI request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| classify(PROVIDER, model, &Failure::from(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(PROVIDER, model, &Failure::from(e)))?;

        if !status.is_success() {
            let failure = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => {
                    let code = err.error.code.as_ref().and_then(Value::as_str).map(str::to_string);
                    Failure::http(status.as_u16(), code, err.error.message)
                }
                Err(_) => Failure::http(
                    status.as_u16(),
                    None,
                    status.canonical_reason().unwrap_or("unexpected response"),
                ),
            };
            return Err(classify(PROVIDER, model, &failure));
        }

        let parsed: Response = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(model, error = %e, "unexpected OpenAI response envelope");
            ProviderError::malformed(PROVIDER, "the response envelope was not recognised")
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no message content was returned"))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    /// JSON-object mode tends to wrap the array under a key of the model's
    /// choosing, so the envelope is unwrapped before validation. No search
    /// is involved, so `sources` is always empty.
    async fn fetch_trends(&self) -> Result<TrendResponse, ProviderError> {
        let request = Request {
            model: &self.config.trend_model,
            messages: vec![
                Message::system(prompt::trend_system_prompt(true)),
                Message::user(MessageContent::Text(prompt::TREND_USER_INSTRUCTION.to_string())),
            ],
            response_format: ResponseFormat::json_object(),
        };

        let content = self.complete(&request).await?;
        let value: Value = serde_json::from_str(content.trim()).map_err(|_| {
            ProviderError::malformed(PROVIDER, "the trend reply was not valid JSON")
        })?;
        let items = extract::unwrap_envelope(value).ok_or_else(|| {
            tracing::warn!(model = request.model, "no array in OpenAI trend object");
            ProviderError::malformed(PROVIDER, "the reply contained no list of trends")
        })?;

        let trends = extract::parse_trend_items(PROVIDER, items)?;
        tracing::debug!(model = request.model, trends = trends.len(), "OpenAI trends parsed");

        Ok(TrendResponse {
            trends,
            sources: Vec::new(),
        })
    }

    async fn rate_creative(&self, creative: &Creative) -> Result<GemReport, ProviderError> {
        let request = Request {
            model: &self.config.rating_model,
            messages: vec![
                Message::system(prompt::gem_system_prompt(true)),
                Message::user(MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt::GEM_USER_INSTRUCTION.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: creative.data_uri(),
                        },
                    },
                ])),
            ],
            response_format: ResponseFormat::json_object(),
        };

        let content = self.complete(&request).await?;
        extract::parse_report(PROVIDER, &content)
    }
}
