//! Integration tests for `OpenAiAdapter` using wiremock HTTP mocks.

use serde_json::{json, Value};
use trendlag::config::OpenAiConfig;
use trendlag::llm::error::ProviderError;
use trendlag::llm::openai::OpenAiAdapter;
use trendlag::llm::provider::{OutputMode, ProviderAdapter};
use trendlag::llm::types::Region;
use trendlag::media::Creative;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(base_url: &str) -> OpenAiAdapter {
    OpenAiAdapter::new(
        "sk-test",
        OpenAiConfig {
            base_url: base_url.to_string(),
            ..OpenAiConfig::default()
        },
    )
}

fn trend_items() -> Value {
    json!([
        {
            "region": "AU",
            "topic": "Curved vanities",
            "description": "Soft edges in small bathrooms",
            "viralScore": 63,
            "trendLagStatus": "Emerging in AU",
            "hashtags": ["#curvedvanity"]
        },
        {
            "region": "us",
            "topic": "Spa showers",
            "description": "Rainheads and benches",
            "viralScore": 91.0,
            "trendLagStatus": "Peaking in US"
        }
    ])
}

/// Wrap `content` the way the Chat Completions API does.
fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

async fn mount_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .mount(server)
        .await;
}

async fn last_request_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.expect("recording enabled");
    let last = requests.last().expect("one request received");
    serde_json::from_slice(&last.body).expect("request body is JSON")
}

#[tokio::test]
async fn wrapped_trends_are_unwrapped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(&json!({ "trends": trend_items() }).to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = adapter(&server.uri()).fetch_trends().await.unwrap();

    assert_eq!(report.trends.len(), 2);
    assert_eq!(report.trends[0].region, Region::Au);
    assert_eq!(report.trends[1].region, Region::Us);
    assert_eq!(report.trends[1].viral_score, 91);
    assert!(report.trends[1].hashtags.is_empty());
    assert!(report.sources.is_empty());

    let body = last_request_body(&server).await;
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["response_format"], json!({ "type": "json_object" }));
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("trendLagStatus"));
}

#[tokio::test]
async fn bare_and_wrapped_arrays_give_same_trends() {
    let bare = MockServer::start().await;
    mount_reply(&bare, &trend_items().to_string()).await;
    let keyed = MockServer::start().await;
    mount_reply(&keyed, &json!({ "viral_trends": trend_items() }).to_string()).await;

    let from_bare = adapter(&bare.uri()).fetch_trends().await.unwrap();
    let from_keyed = adapter(&keyed.uri()).fetch_trends().await.unwrap();

    assert_eq!(from_bare.trends, from_keyed.trends);
}

#[tokio::test]
async fn first_array_field_is_used() {
    let server = MockServer::start().await;
    let content = json!({
        "note": "fresh data",
        "results": trend_items(),
        "other": [1, 2, 3]
    });
    mount_reply(&server, &content.to_string()).await;

    let report = adapter(&server.uri()).fetch_trends().await.unwrap();
    assert_eq!(report.trends[0].topic, "Curved vanities");
}

#[tokio::test]
async fn object_without_array_is_malformed() {
    let server = MockServer::start().await;
    mount_reply(&server, r#"{"message": "no trends today"}"#).await;

    let err = adapter(&server.uri()).fetch_trends().await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn empty_trend_list_is_empty_result() {
    let server = MockServer::start().await;
    mount_reply(&server, r#"{"trends": []}"#).await;

    let err = adapter(&server.uri()).fetch_trends().await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResult { .. }));
}

#[tokio::test]
async fn one_bad_item_fails_the_batch() {
    let server = MockServer::start().await;
    let mut items = trend_items();
    items[1]["region"] = json!("NZ");
    mount_reply(&server, &json!({ "trends": items }).to_string()).await;

    let err = adapter(&server.uri()).fetch_trends().await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn null_content_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })))
        .mount(&server)
        .await;

    let err = adapter(&server.uri()).fetch_trends().await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn rate_limit_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached for gpt-4o in organization org-x on tokens per min.",
                "type": "tokens",
                "code": "rate_limit_exceeded"
            }
        })))
        .mount(&server)
        .await;

    let err = adapter(&server.uri()).fetch_trends().await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited { .. }));
    assert!(!err.to_string().contains("org-x"));
}

#[tokio::test]
async fn invalid_key_is_access_denied() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided: sk-test.",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = adapter(&server.uri()).fetch_trends().await.unwrap_err();
    assert!(matches!(err, ProviderError::AccessDenied { .. }));
    assert!(!err.to_string().contains("sk-test"));
}

#[tokio::test]
async fn overloaded_service_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "message": "The server is overloaded.", "type": "server_error", "code": null }
        })))
        .mount(&server)
        .await;

    let creative = Creative::from_bytes(b"hi", "image/png");
    let err = adapter(&server.uri())
        .rate_creative(&creative)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ServiceOverloaded { .. }));
}

#[tokio::test]
async fn rating_sends_data_uri_and_parses_report() {
    let server = MockServer::start().await;
    let report = json!({
        "totalScore": 58,
        "breakdown": {
            "creativeDiversity": 12, "visualSignal": 16,
            "hookVelocity": 14, "intentMatch": 16
        },
        "reasoning": {
            "creativeDiversity": "Stock-like",
            "visualSignal": "Busy frame",
            "hookVelocity": "Decent first second",
            "intentMatch": "Loose fit"
        },
        "matchedTrend": "Spa showers",
        "improvementTips": ["Tighter crop", "Stronger hook", "Show the product"]
    });
    mount_reply(&server, &report.to_string()).await;

    let creative = Creative::from_bytes(b"hi", "image/jpeg");
    let parsed = adapter(&server.uri()).rate_creative(&creative).await.unwrap();
    assert_eq!(parsed.total_score, 58);
    assert_eq!(parsed.matched_trend, "Spa showers");

    let body = last_request_body(&server).await;
    let content = &body["messages"][1]["content"];
    assert_eq!(content[0]["type"], "text");
    assert_eq!(
        content[1],
        json!({ "type": "image_url", "image_url": { "url": "data:image/jpeg;base64,aGk=" } })
    );
    // No schema is enforced, so the prompt carries the shape.
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("improvementTips"));
}

#[test]
fn reports_freeform_mode() {
    assert_eq!(adapter("http://unused").output_mode(), OutputMode::Freeform);
}
