use crate::config::{Config, DEFAULT_API_BASE_URL, ENV_API_KEY};
use crate::llm::{
    errors::LlmError,
    types::{ChatEnvelope, ChatRequest},
};
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("eventlens/", env!("CARGO_PKG_VERSION"));

/// OpenRouter chat completion client.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Client for a run: key, base URL and request timeout from `config`.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let http_client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.llm_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key().to_string(),
            base_url: config.api_base_url().to_string(),
        })
    }

    /// Set a custom base URL (proxies, local mocks).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON-constrained completion; returns the parsed message content.
    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<Value, LlmError> {
        let request = ChatRequest::new(model, prompt)
            .temperature(temperature)
            .json_object();

        let content = self.content(&request).await?;
        serde_json::from_str(&content).map_err(|e| {
            warn!(error = %e, "Model returned non-JSON content");
            LlmError::MalformedContent(format!("content is not valid JSON: {}", e))
        })
    }

    /// Free-text completion; returns the message content verbatim.
    pub async fn complete_text(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(model, prompt).temperature(temperature);
        self.content(&request).await
    }

    async fn content(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.send(request)
            .await?
            .into_content()?
            .ok_or_else(|| LlmError::MalformedContent("message content is null".to_string()))
    }

    /// POST the request and decode the envelope, whatever the HTTP status.
    #[instrument(skip_all, fields(model = %request.model, temperature = request.temperature))]
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatEnvelope, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Config(format!("{} not set", ENV_API_KEY)));
        }
        let start = Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gateway request failed");
                LlmError::from_reqwest_error(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(LlmError::from_reqwest_error)?;

        let envelope = match serde_json::from_str::<ChatEnvelope>(&body) {
            Ok(envelope) if status.is_success() || envelope.error.is_some() => envelope,
            Err(e) if status.is_success() => return Err(LlmError::Envelope(e.to_string())),
            _ => {
                warn!(status = %status, body = %body, "Gateway API error");
                return Err(LlmError::Gateway {
                    code: i64::from(status.as_u16()),
                    message: body,
                });
            }
        };

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            prompt_tokens = envelope.usage.map(|u| u.prompt_tokens),
            completion_tokens = envelope.usage.map(|u| u.completion_tokens),
            "Gateway chat completion"
        );
        Ok(envelope)
    }
}
