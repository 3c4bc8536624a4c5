//! OpenRouter chat completion request and response types.

use serde::{Deserialize, Serialize};

use crate::llm::errors::LlmError;

pub const DEFAULT_TEMPERATURE: f32 = 0.5;

// =============================================================================
// Request
// =============================================================================

/// Chat completion request with a single user message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<Message>,
    pub provider: ProviderPreferences,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![Message::user(prompt)],
            provider: ProviderPreferences {
                require_parameters: true,
            },
            response_format: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Ask for a JSON object as the message content.
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat::json_object());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider routing preferences.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderPreferences {
    /// Only route to providers that honor every request parameter
    /// (temperature, response_format).
    pub require_parameters: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

// =============================================================================
// Response envelope
// =============================================================================

/// Top-level chat completion response. Depending on `stream` and on whether
/// `messages` or `prompt` was sent, choices come in different shapes, and an
/// error may sit at the top level or on a choice.
#[derive(Debug, Deserialize)]
pub struct ChatEnvelope {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Unix timestamp.
    pub created: Option<i64>,
    pub model: Option<String>,
    /// `chat.completion` or `chat.completion.chunk`.
    pub object: Option<String>,
    pub system_fingerprint: Option<String>,
    pub usage: Option<Usage>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    NonStreaming(NonStreamingChoice),
    Streaming(StreamingChoice),
    NonChat(NonChatChoice),
    /// Only an error, no message, delta or text.
    Failed(FailedChoice),
}

#[derive(Debug, Deserialize)]
pub struct NonStreamingChoice {
    pub finish_reason: Option<String>,
    pub message: ResponseMessage,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct StreamingChoice {
    pub finish_reason: Option<String>,
    pub delta: ResponseMessage,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct NonChatChoice {
    pub finish_reason: Option<String>,
    pub text: String,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct FailedChoice {
    pub finish_reason: Option<String>,
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub role: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Superseded by `tool_calls`.
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatEnvelope {
    /// Narrow the envelope to the message content of its first
    /// non-streaming choice.
    ///
    /// `Ok(None)` means the choice is well-formed but its content is null.
    pub fn into_content(self) -> Result<Option<String>, LlmError> {
        if let Some(error) = self.error {
            return Err(LlmError::Gateway {
                code: error.code,
                message: error.message,
            });
        }

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let (error, kind) = match choice {
            Choice::NonStreaming(choice) => match choice.error {
                Some(error) => (Some(error), "non-streaming"),
                None => return Ok(choice.message.content),
            },
            Choice::Streaming(choice) => (choice.error, "streaming"),
            Choice::NonChat(choice) => (choice.error, "non-chat"),
            Choice::Failed(choice) => (Some(choice.error), "failed"),
        };

        match error {
            Some(error) => Err(LlmError::Choice {
                code: error.code,
                message: error.message,
            }),
            None => Err(LlmError::UnsupportedChoice(kind)),
        }
    }
}
