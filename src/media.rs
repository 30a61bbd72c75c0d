//! Caller-side handling of uploaded creatives.
//!
//! The size gate lives here rather than in the adapters: an oversize file is
//! refused before it is read, encoded, or sent anywhere.

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::llm::error::ProviderError;
use crate::llm::provider::Provider;

/// Inline uploads above this size are refused.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// An image or video ready to send inline, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creative {
    pub mime_type: String,
    pub data_base64: String,
    pub byte_len: u64,
}

impl Creative {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_base64: STANDARD.encode(bytes),
            byte_len: bytes.len() as u64,
        }
    }

    /// Load a creative from disk for `provider`, refusing files over `limit_bytes`.
    pub fn from_file(path: &Path, provider: Provider, limit_bytes: u64) -> Result<Self> {
        let mime_type = mime_for_path(path).with_context(|| {
            format!(
                "Unsupported file type: {}. Use an image (png, jpg, webp, gif, heic) or video (mp4, mov, webm).",
                path.display()
            )
        })?;

        let len = std::fs::metadata(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .len();
        check_size(provider, len, limit_bytes)?;

        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_bytes(&bytes, mime_type))
    }

    /// `data:` URI form, as chat-style APIs expect for inline images.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// Refuse payloads above the inline limit.
pub fn check_size(provider: Provider, len: u64, limit_bytes: u64) -> Result<(), ProviderError> {
    if len > limit_bytes {
        return Err(ProviderError::PayloadTooLarge {
            provider,
            limit_bytes: Some(limit_bytes),
        });
    }
    Ok(())
}

/// MIME type from the file extension, for the formats the models accept.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}
