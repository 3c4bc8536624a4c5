use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    /// The gateway answered with a top-level error (or a non-2xx status).
    #[error("gateway error {code}: {message}")]
    Gateway { code: i64, message: String },

    #[error("gateway returned no choices")]
    EmptyResponse,

    /// The first choice carries its own error.
    #[error("choice error {code}: {message}")]
    Choice { code: i64, message: String },

    /// The first choice is a streaming delta or a non-chat completion.
    #[error("unsupported {0} choice in chat completion response")]
    UnsupportedChoice(&'static str),

    #[error("malformed content: {0}")]
    MalformedContent(String),

    /// The body is not a chat completion envelope at all.
    #[error("undecodable response envelope: {0}")]
    Envelope(String),
}

impl LlmError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
