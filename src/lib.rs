//! Viral trend reports and GEM creative ratings from Gemini or OpenAI.
//!
//! The interesting part is [`llm`]: two provider adapters behind one trait,
//! and the layer that turns loosely formatted model output into validated
//! [`llm::types`] values or a single classified [`llm::error::ProviderError`].

pub mod config;
pub mod llm;
pub mod media;
pub mod paths;
