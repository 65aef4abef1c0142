//! Text-generation provider abstractions.
//!
//! The pipeline only depends on the [`TextGenerator`] trait; the concrete
//! HTTP provider lives behind the `together` feature so library consumers
//! that bring their own generator pay nothing for it.
//!
//! ## Security
//!
//! Providers hold their API keys in [`ApiCredential`], which cannot be
//! accidentally printed and must be exposed explicitly at the point of use.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "together")]
mod together;

pub use secrets::ApiCredential;

#[cfg(feature = "together")]
pub use together::{TogetherProvider, TOGETHER_API_KEY_ENV};

/// Default model requested from the generation backend.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free";

/// Errors from text-generation providers.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse provider response: {0}")]
    Parse(String),

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a generation request.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model to request.
    pub model: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling cutoff.
    pub top_p: f32,

    /// Request timeout.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
            timeout: Duration::from_secs(60),
        }
    }
}

impl GenerationConfig {
    /// Create a config for the given model, defaults elsewhere.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Text produced by a generation backend.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    /// The generated content.
    pub content: String,

    /// Model that actually served the request.
    pub model: String,
}

/// Provider abstraction for the generation step of the pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt.
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GeneratedText, GeneratorError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Generator that answers without any network call.
///
/// With a canned reply it returns that reply for every prompt; without one
/// it echoes the prompt back. Used by tests and by `run --offline`.
#[derive(Debug, Clone, Default)]
pub struct StaticGenerator {
    reply: Option<String>,
}

impl StaticGenerator {
    /// Echo the prompt back as the generated output.
    pub fn echo() -> Self {
        Self { reply: None }
    }

    /// Return a fixed reply for every prompt.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GeneratedText, GeneratorError> {
        let content = self
            .reply
            .clone()
            .unwrap_or_else(|| prompt.to_string());

        Ok(GeneratedText {
            content,
            model: config.model.clone(),
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}
