use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::services::suggestions::suggest;
use crate::services::{ResolvedImage, ServiceError};
use crate::state::AppState;
use crate::utils::text::encode_url_name;
use crate::utils::timing::start_request_timer;

pub const PROMPT_REQUIRED: &str = "Please describe your character traits.";
pub const CONFIGURATION_ERROR: &str =
    "Server configuration error. Please contact the administrator.";
pub const NO_SUGGESTIONS: &str =
    "Could not generate character suggestions based on your input. Try different traits.";
pub const NO_IMAGES: &str = "Found character suggestions, but could not fetch images for them.";
pub const UNEXPECTED: &str = "An unexpected error occurred on the server. Please try again later.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterResult {
    pub name: String,
    pub image_data: String,
    pub url_name: String,
    pub mime_type: String,
}

impl CharacterResult {
    fn new(name: String, image: &ResolvedImage) -> Self {
        Self {
            url_name: encode_url_name(&name),
            image_data: image.to_base64(),
            mime_type: image.mime_type.clone(),
            name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub characters: Vec<CharacterResult>,
}

fn extract_prompt(body: Result<Json<Value>, JsonRejection>) -> Option<String> {
    let Json(value) = body.ok()?;
    value
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .map(str::to_string)
}

fn map_service_error(err: ServiceError) -> AppError {
    match err {
        ServiceError::Validation(message) => AppError::Validation(message),
        ServiceError::Configuration => {
            error!("Configuration error: language model credential is missing.");
            AppError::Configuration(CONFIGURATION_ERROR.to_string())
        }
        upstream @ ServiceError::Upstream { .. } => AppError::Unexpected {
            message: UNEXPECTED,
            detail: anyhow::Error::new(upstream),
        },
    }
}

async fn generate_characters(
    state: &AppState,
    prompt: Option<&str>,
) -> Result<GenerateResponse, AppError> {
    let traits = prompt.ok_or_else(|| AppError::validation(PROMPT_REQUIRED))?;

    if !state.model.is_configured() {
        error!("Language model API key is missing during request processing.");
        return Err(AppError::Configuration(CONFIGURATION_ERROR.to_string()));
    }

    let names = suggest(state.model.as_ref(), &state.suggestion, traits)
        .await
        .map_err(map_service_error)?;
    if names.is_empty() {
        return Err(AppError::NotFound(NO_SUGGESTIONS.to_string()));
    }

    let mut characters = Vec::with_capacity(names.len());
    for name in names {
        info!("Processing character: {}", name);
        match state.resolver.resolve(&name).await {
            Some(image) => characters.push(CharacterResult::new(name, &image)),
            None => warn!(
                "Skipping character '{}' due to missing/failed image fetch.",
                name
            ),
        }
    }

    if characters.is_empty() {
        return Err(AppError::NotFound(NO_IMAGES.to_string()));
    }
    Ok(GenerateResponse { characters })
}

pub async fn generate_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let prompt = extract_prompt(body);
    let mut timer = start_request_timer("POST /generate", prompt.as_deref());

    let result = generate_characters(&state, prompt.as_deref()).await;
    match &result {
        Ok(response) => timer.mark_status(
            200,
            Some(format!("characters={}", response.characters.len())),
        ),
        Err(err) => timer.mark_status(err.status_code().as_u16(), Some(err.to_string())),
    }
    result.map(Json)
}
