//! Together AI chat-completions provider.
//!
//! Speaks the OpenAI-style `/chat/completions` wire format against the
//! Together API. The API key comes from the environment or is supplied
//! programmatically, and is held in an [`ApiCredential`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use super::{ApiCredential, GeneratedText, GenerationConfig, GeneratorError, TextGenerator};

/// Environment variable holding the Together API key.
pub const TOGETHER_API_KEY_ENV: &str = "TOGETHER_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";

/// Together AI text-generation provider.
#[derive(Debug)]
pub struct TogetherProvider {
    credential: ApiCredential,
    base_url: String,
}

impl TogetherProvider {
    /// Create a provider with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(api_key, "Together API key"),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a provider from the `TOGETHER_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, GeneratorError> {
        let credential = ApiCredential::from_env(TOGETHER_API_KEY_ENV, "Together API key")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at a custom endpoint (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn client() -> &'static reqwest::Client {
        static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
        CLIENT.get_or_init(reqwest::Client::new)
    }
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl TextGenerator for TogetherProvider {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GeneratedText, GeneratorError> {
        let request = ChatRequest {
            model: &config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stream: false,
        };

        // The credential is exposed only here, at the point of use.
        let response = Self::client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(config.timeout)
                } else {
                    GeneratorError::Http(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(GeneratorError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| GeneratorError::Parse("response contained no choices".to_string()))?;

        Ok(GeneratedText {
            content,
            model: body.model.unwrap_or_else(|| config.model.clone()),
        })
    }

    fn name(&self) -> &str {
        "together"
    }
}
