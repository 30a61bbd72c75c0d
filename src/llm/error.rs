use thiserror::Error;

use super::provider::Provider;

/// Longest upstream message carried into a [`ProviderError::TransportError`].
const MAX_DETAIL_CHARS: usize = 200;

/// Every way a provider call can fail, as shown to the user.
///
/// The `Display` text of each variant is a short sentence meant to be shown
/// verbatim in place of results. Raw response bodies and keys never end up in
/// here.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key is missing. Set {env_var} in your environment or .env file.")]
    MissingCredential {
        provider: Provider,
        env_var: &'static str,
    },

    #[error("{provider} denied access. Check that the API key is valid and allowed to use this model.")]
    AccessDenied { provider: Provider },

    #[error("{provider} model `{model}` was not found (404). It may have been renamed or retired.")]
    ModelNotFound { provider: Provider, model: String },

    #[error("{provider} rate limit reached (429). Wait a moment, then try again.")]
    RateLimited { provider: Provider },

    #[error("{provider} is overloaded right now (503). Try again shortly.")]
    ServiceOverloaded { provider: Provider },

    #[error("{}", too_large_message(.provider, .limit_bytes))]
    PayloadTooLarge {
        provider: Provider,
        /// Set when the limit is ours; `None` when the provider rejected it.
        limit_bytes: Option<u64>,
    },

    #[error("{provider} returned a response that could not be used: {detail}.")]
    MalformedResponse { provider: Provider, detail: String },

    #[error("{provider} returned no trends. Try again.")]
    EmptyResult { provider: Provider },

    #[error("{provider} request failed: {detail}")]
    TransportError { provider: Provider, detail: String },
}

impl ProviderError {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderError::MissingCredential { provider, .. }
            | ProviderError::AccessDenied { provider }
            | ProviderError::ModelNotFound { provider, .. }
            | ProviderError::RateLimited { provider }
            | ProviderError::ServiceOverloaded { provider }
            | ProviderError::PayloadTooLarge { provider, .. }
            | ProviderError::MalformedResponse { provider, .. }
            | ProviderError::EmptyResult { provider }
            | ProviderError::TransportError { provider, .. } => *provider,
        }
    }

    pub(crate) fn malformed(provider: Provider, detail: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider,
            detail: detail.into(),
        }
    }
}

fn too_large_message(provider: &Provider, limit_bytes: &Option<u64>) -> String {
    match *limit_bytes {
        Some(limit) => format!(
            "File size exceeds the {}MB limit for inline analysis with {provider}.",
            limit / (1024 * 1024)
        ),
        None => format!("{provider} rejected the upload as too large (413). Use a smaller file."),
    }
}

/// What we know about a failed upstream call, gathered before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failure {
    /// HTTP status, when a response arrived at all.
    pub status: Option<u16>,
    /// Machine-readable error token from the provider's error body, e.g.
    /// Gemini's `RESOURCE_EXHAUSTED` or OpenAI's `rate_limit_exceeded`.
    pub code: Option<String>,
    /// Human-readable message from the provider or the HTTP client.
    pub message: String,
}

impl Failure {
    pub fn http(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            code: None,
            message: err.without_url().to_string(),
        }
    }
}

/// Map a failed call onto the error taxonomy.
///
/// Checked in order, first match wins:
///   1. HTTP status code
///   2. the provider's error token
///   3. substrings of the message
///   4. otherwise a generic transport error
///
/// Step 3 is a known-fragile fallback for failures that arrive without a
/// status or token (for instance an error relayed inside a 200 or a 500).
pub fn classify(provider: Provider, model: &str, failure: &Failure) -> ProviderError {
    failure
        .status
        .and_then(|status| by_status(provider, model, status))
        .or_else(|| {
            failure
                .code
                .as_deref()
                .and_then(|code| by_code(provider, model, code))
        })
        .or_else(|| by_message(provider, model, &failure.message))
        .unwrap_or_else(|| ProviderError::TransportError {
            provider,
            detail: transport_detail(failure),
        })
}

fn by_status(provider: Provider, model: &str, status: u16) -> Option<ProviderError> {
    match status {
        401 | 403 => Some(ProviderError::AccessDenied { provider }),
        404 => Some(ProviderError::ModelNotFound {
            provider,
            model: model.to_string(),
        }),
        413 => Some(ProviderError::PayloadTooLarge {
            provider,
            limit_bytes: None,
        }),
        429 => Some(ProviderError::RateLimited { provider }),
        503 => Some(ProviderError::ServiceOverloaded { provider }),
        _ => None,
    }
}

fn by_code(provider: Provider, model: &str, code: &str) -> Option<ProviderError> {
    match code.to_ascii_lowercase().as_str() {
        "resource_exhausted" | "rate_limit_exceeded" | "insufficient_quota" => {
            Some(ProviderError::RateLimited { provider })
        }
        "permission_denied" | "unauthenticated" | "invalid_api_key" | "api_key_invalid" => {
            Some(ProviderError::AccessDenied { provider })
        }
        "not_found" | "model_not_found" => Some(ProviderError::ModelNotFound {
            provider,
            model: model.to_string(),
        }),
        "unavailable" | "server_overloaded" => Some(ProviderError::ServiceOverloaded { provider }),
        _ => None,
    }
}

fn by_message(provider: Provider, model: &str, message: &str) -> Option<ProviderError> {
    let m = message.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| m.contains(n));

    if has(&["429", "rate limit", "resource_exhausted", "quota"]) {
        Some(ProviderError::RateLimited { provider })
    } else if has(&["403", "permission_denied", "permission denied", "api key not valid"]) {
        Some(ProviderError::AccessDenied { provider })
    } else if has(&["404", "not_found", "not found"]) {
        Some(ProviderError::ModelNotFound {
            provider,
            model: model.to_string(),
        })
    } else if has(&["503", "overloaded", "unavailable"]) {
        Some(ProviderError::ServiceOverloaded { provider })
    } else if has(&["413", "too large"]) {
        Some(ProviderError::PayloadTooLarge {
            provider,
            limit_bytes: None,
        })
    } else {
        None
    }
}

fn transport_detail(failure: &Failure) -> String {
    let message = failure.message.trim();
    let message = if message.is_empty() {
        "no details from the server"
    } else {
        message
    };
    let truncated: String = message.chars().take(MAX_DETAIL_CHARS).collect();
    let ellipsis = if message.chars().count() > MAX_DETAIL_CHARS { "..." } else { "" };

    match failure.status {
        Some(status) => format!("HTTP {status}: {truncated}{ellipsis}"),
        None => format!("{truncated}{ellipsis}"),
    }
}
