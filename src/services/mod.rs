pub mod image_resolver;
pub mod persona_chat;
pub mod suggestions;

use thiserror::Error;

use crate::llm::LlmError;

pub use image_resolver::{ImageResolver, ResolvedImage};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("language model is not configured")]
    Configuration,
    #[error("language model request failed: {message}")]
    Upstream { status: Option<u16>, message: String },
}

impl From<LlmError> for ServiceError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => ServiceError::Configuration,
            other => ServiceError::Upstream {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}
