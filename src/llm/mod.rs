pub mod client;
pub mod errors;
pub mod stages;
pub mod types;

pub use client::OpenRouterClient;
pub use errors::LlmError;
pub use types::{ChatEnvelope, ChatRequest, Choice, DEFAULT_TEMPERATURE};
