//! Run configuration.
//!
//! A run is fully described by a `Config`: which page to read, which model to
//! ask, which language the isolated prose should be written in, and how to
//! reach the gateway. `Config::from_env` loads it from environment variables
//! with development defaults; the binary layers CLI flags on top.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use url::Url;

/// Environment variable names.
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_API_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_URL: &str = "EVENTLENS_URL";
pub const ENV_MODEL: &str = "EVENTLENS_MODEL";
pub const ENV_LANGUAGE: &str = "EVENTLENS_LANGUAGE";

pub const DEFAULT_URL: &str = "https://www.facebook.com/events/385966024501401";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";
pub const DEFAULT_LANGUAGE: &str = "French";
pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_ISOLATION_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

const MAX_TEMPERATURE: f32 = 2.0;

/// Configuration for one extraction run.
#[derive(Clone, PartialEq)]
pub struct Config {
    url: Url,
    model: String,
    language: String,
    isolation_temperature: f32,
    api_key: String,
    api_base_url: String,
    nav_timeout: Duration,
    llm_timeout: Duration,
}

impl Config {
    /// Create a config with default model, language and timeouts.
    pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url(url)?,
            model: DEFAULT_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            isolation_temperature: DEFAULT_ISOLATION_TEMPERATURE,
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            nav_timeout: DEFAULT_NAV_TIMEOUT,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        })
    }

    /// Load from environment variables, falling back to defaults for
    /// everything except the API key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = api_key_from_env()?;
        let url = env::var(ENV_URL).unwrap_or_else(|_| DEFAULT_URL.to_string());

        let mut config = Self::new(&url, api_key)?;
        if let Ok(model) = env::var(ENV_MODEL) {
            config = config.with_model(model);
        }
        if let Ok(language) = env::var(ENV_LANGUAGE) {
            config = config.with_language(language);
        }
        if let Ok(base_url) = env::var(ENV_API_BASE_URL) {
            config = config.with_api_base_url(base_url);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Temperature of the isolation stage. Must lie in `0.0..=2.0`.
    pub fn with_isolation_temperature(mut self, temperature: f32) -> Result<Self, ConfigError> {
        if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                field: "isolation_temperature",
                reason: format!("{} is outside 0.0..={}", temperature, MAX_TEMPERATURE),
            });
        }
        self.isolation_temperature = temperature;
        Ok(self)
    }

    pub fn with_nav_timeout(mut self, timeout: Duration) -> Self {
        self.nav_timeout = timeout;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    /// Page to extract the event from.
    pub fn url(&self) -> &Url {
        &self.url
    }
    /// Gateway model identifier, e.g. `openai/gpt-4`.
    pub fn model(&self) -> &str {
        &self.model
    }
    /// Language the isolation stage answers in.
    pub fn language(&self) -> &str {
        &self.language
    }
    pub fn isolation_temperature(&self) -> f32 {
        self.isolation_temperature
    }
    /// Bearer credential for the gateway.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
    pub fn nav_timeout(&self) -> Duration {
        self.nav_timeout
    }
    pub fn llm_timeout(&self) -> Duration {
        self.llm_timeout
    }
}

// The API key never shows up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url.as_str())
            .field("model", &self.model)
            .field("language", &self.language)
            .field("isolation_temperature", &self.isolation_temperature)
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("nav_timeout", &self.nav_timeout)
            .field("llm_timeout", &self.llm_timeout)
            .finish()
    }
}

/// The gateway credential. Absent or blank is a configuration error.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    env::var(ENV_API_KEY)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingVar(ENV_API_KEY))
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidValue {
        field: "url",
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ConfigError::InvalidValue {
            field: "url",
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    MissingVar(&'static str),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(name) => {
                write!(f, "environment variable {} is not set", name)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
