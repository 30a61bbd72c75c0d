use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{classify, Failure, ProviderError};
use super::extract;
use super::prompt;
use super::provider::{Provider, ProviderAdapter};
use super::types::{GemReport, TrendResponse, WebSource};
use crate::config::GeminiConfig;
use crate::media::Creative;

const PROVIDER: Provider = Provider::Gemini;

/// Title used for citations the API returned without one.
const UNTITLED_SOURCE: &str = "Untitled source";

/// Request body for the generateContent endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData(Blob<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

impl<'a> Content<'a> {
    fn system(text: &'a str) -> Self {
        Self {
            role: None,
            parts: vec![Part::Text(text)],
        }
    }

    fn user(parts: Vec<Part<'a>>) -> Self {
        Self {
            role: Some("user"),
            parts,
        }
    }
}

impl GenerationConfig {
    fn json(schema: Value) -> Self {
        Self {
            response_mime_type: "application/json",
            response_schema: schema,
        }
    }
}

/// Response from generateContent.
/// We only parse the fields we need.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    /// Thinking models interleave thought summaries with the answer.
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

/// Gemini error response shape.
#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

impl Response {
    /// Answer text of the first candidate, thoughts skipped.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// Web citations from the grounding side-channel, first occurrence of
    /// each URI kept.
    fn sources(&self) -> Vec<WebSource> {
        let chunks = self
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.as_slice())
            .unwrap_or_default();

        let mut sources: Vec<WebSource> = Vec::new();
        for web in chunks.iter().filter_map(|c| c.web.as_ref()) {
            let Some(uri) = web.uri.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            if sources.iter().any(|s| s.uri == uri) {
                continue;
            }
            let title = web
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(UNTITLED_SOURCE);
            sources.push(WebSource {
                title: title.to_string(),
                uri: uri.to_string(),
            });
        }
        sources
    }
}

/// Structured-output adapter for the Gemini API.
pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiAdapter {
    pub fn new(api_key: impl Into<String>, config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Build an adapter with the key from the environment.
    pub fn from_env(config: GeminiConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(PROVIDER.api_key()?, config))
    }

    async fn generate(&self, model: &str, request: &Request<'_>) -> Result<Response, ProviderError> {
        let url = format!(
            "{}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        );
        tracing::debug!(model, grounded = !request.tools.is_empty(), "sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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
                Ok(err) => Failure::http(status.as_u16(), err.error.status, err.error.message),
                Err(_) => Failure::http(
                    status.as_u16(),
                    None,
                    status.canonical_reason().unwrap_or("unexpected response"),
                ),
            };
            return Err(classify(PROVIDER, model, &failure));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(model, error = %e, "unexpected Gemini response envelope");
            ProviderError::malformed(PROVIDER, "the response envelope was not recognised")
        })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    /// With search grounding the API refuses a response schema, so the shape
    /// goes into the prompt instead and the text is recovered as free text.
    async fn fetch_trends(&self) -> Result<TrendResponse, ProviderError> {
        let model = self.config.trend_model.as_str();
        let grounded = self.config.search_grounding;
        let system = prompt::trend_system_prompt(grounded);

        let request = Request {
            system_instruction: Content::system(&system),
            contents: vec![Content::user(vec![Part::Text(prompt::TREND_USER_INSTRUCTION)])],
            generation_config: (!grounded).then(|| GenerationConfig::json(prompt::trend_schema())),
            tools: if grounded {
                vec![Tool { google_search: GoogleSearch {} }]
            } else {
                Vec::new()
            },
        };

        let response = self.generate(model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no data was received"))?;

        let items = if grounded {
            extract::recover_array(&text)
        } else {
            extract::parse_array(&text)
        }
        .ok_or_else(|| {
            tracing::warn!(model, grounded, "no JSON array in Gemini trend text");
            ProviderError::malformed(PROVIDER, "the response did not contain recoverable JSON")
        })?;

        let trends = extract::parse_trend_items(PROVIDER, items)?;
        let sources = if grounded { response.sources() } else { Vec::new() };
        tracing::debug!(model, trends = trends.len(), sources = sources.len(), "Gemini trends parsed");

        Ok(TrendResponse { trends, sources })
    }

    async fn rate_creative(&self, creative: &Creative) -> Result<GemReport, ProviderError> {
        let model = self.config.rating_model.as_str();
        let system = prompt::gem_system_prompt(false);

        let request = Request {
            system_instruction: Content::system(&system),
            contents: vec![Content::user(vec![
                Part::InlineData(Blob {
                    mime_type: &creative.mime_type,
                    data: &creative.data_base64,
                }),
                Part::Text(prompt::GEM_USER_INSTRUCTION),
            ])],
            generation_config: Some(GenerationConfig::json(prompt::gem_schema())),
            tools: Vec::new(),
        };

        let response = self.generate(model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no analysis was received"))?;

        extract::parse_report(PROVIDER, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grounded_request_has_tool_and_no_schema() {
        let request = Request {
            system_instruction: Content::system("sys"),
            contents: vec![Content::user(vec![Part::Text("go")])],
            generation_config: None,
            tools: vec![Tool { google_search: GoogleSearch {} }],
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["tools"], json!([{ "googleSearch": {} }]));
        assert!(wire.get("generationConfig").is_none());
        assert_eq!(wire["systemInstruction"], json!({ "parts": [{ "text": "sys" }] }));
        assert_eq!(wire["contents"][0]["role"], "user");
    }

    #[test]
    fn inline_data_part_shape() {
        let part = Part::InlineData(Blob {
            mime_type: "image/png",
            data: "aGk=",
        });
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({ "inlineData": { "mimeType": "image/png", "data": "aGk=" } })
        );
    }

    #[test]
    fn structured_request_has_schema_and_no_tools() {
        let request = Request {
            system_instruction: Content::system("sys"),
            contents: vec![],
            generation_config: Some(GenerationConfig::json(json!({ "type": "ARRAY" }))),
            tools: Vec::new(),
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("tools").is_none());
        assert_eq!(wire["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(wire["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn response_text_skips_thoughts() {
        let response: Response = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking about it", "thought": true },
                    { "text": "[1," },
                    { "text": "2]" }
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: Response =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        assert!(response.text().is_none());
        assert!(response.sources().is_empty());
    }

    #[test]
    fn sources_mapped_and_deduplicated() {
        let response: Response = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[]" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.example", "title": "A" } },
                    { "web": { "uri": "https://b.example" } },
                    { "web": { "uri": "https://a.example", "title": "A again" } },
                    { "web": { "title": "no uri" } },
                    { "retrievedContext": {} }
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(
            response.sources(),
            vec![
                WebSource { title: "A".into(), uri: "https://a.example".into() },
                WebSource { title: UNTITLED_SOURCE.into(), uri: "https://b.example".into() },
            ]
        );
    }
}
