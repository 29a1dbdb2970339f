use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures surfaced at the HTTP boundary. Every variant renders as
/// `{"error": message}`; server-side detail never reaches the body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{message}")]
    Upstream {
        status: Option<StatusCode>,
        message: String,
    },
    /// Nothing usable came back. Reported as a server error, not a 404.
    #[error("{0}")]
    NotFound(String),
    #[error("{message}: {detail:#}")]
    Unexpected {
        message: &'static str,
        detail: anyhow::Error,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => {
                status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Configuration(_) | AppError::NotFound(_) | AppError::Unexpected { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(message)
            | AppError::Configuration(message)
            | AppError::NotFound(message)
            | AppError::Upstream { message, .. } => message.clone(),
            AppError::Unexpected { message, .. } => message.to_string(),
        }
    }
}

pub fn forwardable_status(status: Option<u16>) -> Option<StatusCode> {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_client_error() || code.is_server_error())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unexpected { detail, .. } = &self {
            error!("Unexpected error while handling request: {detail:?}");
        }
        let status = self.status_code();
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
