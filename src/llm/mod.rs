pub mod groq;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use groq::GroqClient;
pub use types::{ChatHistory, ChatMessage, ChatRole, CompletionRequest};

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("GROQ_API_KEY is not configured")]
    NotConfigured,
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn provider(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
